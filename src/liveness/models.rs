use actix_web::body::BoxBody;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use std::fmt;

/// Key-value form of a check request, as sent in a query string or JSON body.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CheckParams {
    #[serde(default)]
    pub url: Option<String>,
}

/// What the entry point received before it is handed to the checker.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInput {
    /// The request body is the url itself
    Raw(String),
    Params(CheckParams),
}

impl CheckInput {
    /// A missing `url` parameter becomes an empty string and fails validation.
    pub fn into_url(self) -> String {
        match self {
            Self::Raw(url) => url,
            Self::Params(params) => params.url.unwrap_or_default(),
        }
    }
}

impl From<String> for CheckInput {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<CheckParams> for CheckInput {
    fn from(value: CheckParams) -> Self {
        Self::Params(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Up,
    Down,
    Invalid(String),
}

impl CheckResult {
    pub fn invalid_url(url: &str) -> Self {
        Self::Invalid(format!("invalid or empty url: \"{}\"", url))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Up | Self::Down => StatusCode::OK,
            Self::Invalid(_) => StatusCode::CONFLICT,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

impl Responder for CheckResult {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}
