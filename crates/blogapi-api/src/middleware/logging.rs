//! Request logging middleware.
//!
//! Emits one event when a request arrives and one when its response leaves,
//! both under the `blogapi::http` target.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::info;

use super::request_id::REQUEST_ID_HEADER;

/// Layer that logs HTTP requests and responses.
#[derive(Clone, Default)]
pub struct RequestLoggingLayer;

impl RequestLoggingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggingService { inner }
    }
}

#[derive(Clone)]
pub struct RequestLoggingService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLoggingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let start = Instant::now();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            info!(
                target: "blogapi::http",
                request_id = %request_id,
                method = %method,
                path = %path,
                "Incoming request"
            );

            let response = inner.call(request).await?;

            info!(
                target: "blogapi::http",
                request_id = %request_id,
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Response status"
            );

            Ok(response)
        })
    }
}
