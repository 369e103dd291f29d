//! Request timing middleware.
//!
//! Every response gets an `X-Process-Time` header holding the handling time
//! in seconds as a float. The same measurement feeds the `metrics` facade:
//!
//! - `blogapi_http_requests_total` - counter by method, path, status_class
//! - `blogapi_http_request_duration_seconds` - histogram by method, path, status_class
//!
//! Paths are the matched route pattern (`/blogpost/:blogpost_id/`), not the
//! raw URI, to keep label cardinality bounded.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    extract::MatchedPath,
    http::{HeaderValue, Request, Response},
};
use tower::{Layer, Service};
use tracing::info;

/// Response header carrying the processing time in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Label used for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Point-in-time copy of [`RequestMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSummary {
    pub requests: u64,
    pub success: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub avg_duration_us: u64,
}

/// Request counters kept alongside the exported metrics so they can be read
/// back in-process.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    request_count: AtomicU64,
    total_duration_us: AtomicU64,
    success_count: AtomicU64,
    client_error_count: AtomicU64,
    server_error_count: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished request.
    pub fn record(&self, method: &str, path: &str, status: u16, duration: Duration) {
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_us
            .fetch_add(duration_us, Ordering::Relaxed);

        let status_class = match status {
            200..=299 => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
                "2xx"
            }
            400..=499 => {
                self.client_error_count.fetch_add(1, Ordering::Relaxed);
                "4xx"
            }
            500..=599 => {
                self.server_error_count.fetch_add(1, Ordering::Relaxed);
                "5xx"
            }
            _ => "other",
        };

        let labels = [
            ("method", method.to_string()),
            ("path", path.to_string()),
            ("status_class", status_class.to_string()),
        ];
        metrics::counter!("blogapi_http_requests_total", &labels).increment(1);
        metrics::histogram!("blogapi_http_request_duration_seconds", &labels)
            .record(duration.as_secs_f64());
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn client_error_count(&self) -> u64 {
        self.client_error_count.load(Ordering::Relaxed)
    }

    pub fn server_error_count(&self) -> u64 {
        self.server_error_count.load(Ordering::Relaxed)
    }

    pub fn total_duration_us(&self) -> u64 {
        self.total_duration_us.load(Ordering::Relaxed)
    }

    pub fn avg_duration_us(&self) -> u64 {
        let count = self.request_count();
        if count == 0 {
            0
        } else {
            self.total_duration_us() / count
        }
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            requests: self.request_count(),
            success: self.success_count(),
            client_errors: self.client_error_count(),
            server_errors: self.server_error_count(),
            avg_duration_us: self.avg_duration_us(),
        }
    }

    /// Emits the counters as one `info` event, used when the server stops.
    pub fn log_summary(&self) {
        let summary = self.summary();
        info!(
            requests = summary.requests,
            success = summary.success,
            client_errors = summary.client_errors,
            server_errors = summary.server_errors,
            avg_duration_us = summary.avg_duration_us,
            "Request summary"
        );
    }
}

/// Layer that times requests.
#[derive(Clone)]
pub struct TimingLayer {
    metrics: Arc<RequestMetrics>,
}

impl TimingLayer {
    pub fn new(metrics: Arc<RequestMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl<S> Layer<S> for TimingLayer {
    type Service = TimingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimingService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[derive(Clone)]
pub struct TimingService<S> {
    inner: S,
    metrics: Arc<RequestMetrics>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TimingService<S>
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
        let start = Instant::now();
        let method = request.method().to_string();
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| UNMATCHED_PATH.to_string());
        let metrics = Arc::clone(&self.metrics);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            let elapsed = start.elapsed();

            if let Ok(value) = HeaderValue::from_str(&elapsed.as_secs_f64().to_string()) {
                response.headers_mut().insert(PROCESS_TIME_HEADER, value);
            }
            metrics.record(&method, &path, response.status().as_u16(), elapsed);

            Ok(response)
        })
    }
}
