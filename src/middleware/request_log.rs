use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;

/// Writes one access line per request once the response status is known.
pub struct RequestLog;

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogMiddleware { service }))
    }
}

pub struct RequestLogMiddleware<S> {
    service: S,
}

struct AccessEntry {
    addr: String,
    method: String,
    scheme: String,
    path: String,
}

impl AccessEntry {
    fn from_request(req: &ServiceRequest) -> Self {
        let connection = req.connection_info();
        let path = req
            .uri()
            .path_and_query()
            .map(|path| path.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());

        Self {
            addr: connection.peer_addr().unwrap_or("-").to_string(),
            method: req.method().to_string(),
            scheme: connection.scheme().to_string(),
            path,
        }
    }
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let entry = AccessEntry::from_request(&req);
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            tracing::info!(
                addr = %entry.addr,
                method = %entry.method,
                scheme = %entry.scheme,
                path = %entry.path,
                status = res.status().as_u16(),
                "Request handled"
            );
            Ok(res)
        })
    }
}
