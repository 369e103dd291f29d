//! HTTP middleware.
//!
//! Includes:
//! - Request id propagation
//! - Request timing, `X-Process-Time` and request metrics
//! - Tracing spans
//! - Request logging
//! - Request timeout
//! - CORS configuration

mod logging;
mod request_id;
mod timeout;
mod timing;
mod tracing_layer;

pub use logging::RequestLoggingLayer;
pub use request_id::{RequestIdLayer, REQUEST_ID_HEADER};
pub use timeout::enforce_timeout;
pub use timing::{RequestMetrics, RequestSummary, TimingLayer, PROCESS_TIME_HEADER};
pub use tracing_layer::TracingLayer;

use tower_http::cors::{Any, CorsLayer};

/// Creates a CORS layer that accepts any origin, method and header.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}
