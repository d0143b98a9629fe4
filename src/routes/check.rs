use crate::liveness::{CheckInput, CheckParams, CheckResult, LivenessProbe};
use actix_web::{get, post, web, Either};
use std::sync::Arc;

#[tracing::instrument(name = "check_from_query", skip(probe, query))]
#[get("/")]
pub async fn check_query(
    probe: web::Data<Arc<dyn LivenessProbe>>,
    query: web::Query<CheckParams>,
) -> CheckResult {
    let input = CheckInput::from(query.into_inner());
    probe.check(&input.into_url()).await
}

/// Accepts `{"url": "..."}` as JSON, anything else is taken as the url itself.
/// Bodies that are not UTF-8 are decoded lossily and fail validation.
#[tracing::instrument(name = "check_from_body", skip(probe, body))]
#[post("/")]
pub async fn check_body(
    probe: web::Data<Arc<dyn LivenessProbe>>,
    body: Either<web::Json<CheckParams>, web::Bytes>,
) -> CheckResult {
    let input = match body {
        Either::Left(params) => CheckInput::from(params.into_inner()),
        Either::Right(raw) => CheckInput::from(String::from_utf8_lossy(&raw).into_owned()),
    };
    probe.check(&input.into_url()).await
}
