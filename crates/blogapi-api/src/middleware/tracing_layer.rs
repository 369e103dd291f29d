//! `http_request` span around each request.
//!
//! The span carries the method, URI, matched route and request id, so every
//! handler and storage event logged while serving the request is tagged with
//! them. `http.status_code` is recorded once the response is known.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::MatchedPath,
    http::{Request, Response},
};
use tower::{Layer, Service};
use tracing::{field::Empty, info_span, Instrument, Span};

use super::request_id::REQUEST_ID_HEADER;

#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = SpanService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SpanService(inner)
    }
}

#[derive(Clone)]
pub struct SpanService<S>(S);

/// Builds the span for `request`. Unmatched requests get an empty route.
fn request_span<B>(request: &Request<B>) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or("", MatchedPath::as_str);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        route,
        request_id,
        http.status_code = Empty,
    )
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SpanService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let span = request_span(&request);
        // Call the instance that was polled ready, leave a fresh clone behind.
        let fresh = self.0.clone();
        let mut ready = std::mem::replace(&mut self.0, fresh);
        let response = ready.call(request);

        Box::pin(
            async move {
                let response = response.await?;
                Span::current().record("http.status_code", response.status().as_u16());
                Ok(response)
            }
            .instrument(span),
        )
    }
}
