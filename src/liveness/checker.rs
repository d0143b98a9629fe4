use super::models::CheckResult;
use crate::configuration::CheckerSettings;
use async_trait::async_trait;
use opentelemetry::propagation::Injector;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;
use tracing::{Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Classifies a url as up or down. Implementations never fail: anything that
/// goes wrong while contacting the target is a `Down`.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn check(&self, url: &str) -> CheckResult;
}

/// Structural check only: a scheme and a non-empty host, no network access.
pub fn validate(url: Option<&str>) -> bool {
    let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
        return false;
    };

    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().map_or(false, |host| !host.is_empty()),
        Err(_) => false,
    }
}

pub struct HttpLivenessChecker {
    client: reqwest::Client,
}

impl HttpLivenessChecker {
    pub fn new(settings: &CheckerSettings) -> Result<Self, CheckerError> {
        let user_agent = settings.user_agent.clone().unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Trace context of `span` as request headers, empty when spans are not exported.
fn trace_headers(span: &Span) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let context = span.context();
    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&context, &mut HeaderInjector(&mut headers))
    });
    headers
}

#[async_trait]
impl LivenessProbe for HttpLivenessChecker {
    #[tracing::instrument(
        name = "handle",
        skip(self, url),
        fields(url = tracing::field::Empty, response = tracing::field::Empty)
    )]
    async fn check(&self, url: &str) -> CheckResult {
        let url = url.trim();
        let span = Span::current();
        span.record("url", url);

        if !validate(Some(url)) {
            let result = CheckResult::invalid_url(url);
            tracing::warn!(reason = %result, "Rejected url");
            return result;
        }

        let request_span = tracing::info_span!(
            "HTTP GET",
            otel.kind = "client",
            http.method = "GET",
            http.url = %url,
            http.status_code = tracing::field::Empty
        );
        let outcome = self
            .client
            .get(url)
            .headers(trace_headers(&request_span))
            .send()
            .instrument(request_span.clone())
            .await;

        let result = match outcome {
            Ok(response) if response.status().as_u16() > 399 => {
                let status = response.status().as_u16();
                request_span.record("http.status_code", status);
                tracing::debug!(status, "Target responded with an error status");
                CheckResult::Down
            }
            Ok(response) => {
                request_span.record("http.status_code", response.status().as_u16());
                CheckResult::Up
            }
            Err(err) => {
                if err.is_connect() || err.is_timeout() {
                    tracing::warn!(error = %err, "Target unreachable");
                } else {
                    tracing::warn!(error = ?err, "Request to target failed");
                }
                CheckResult::Down
            }
        };

        span.record("response", tracing::field::display(&result));
        result
    }
}
