//! Observability infrastructure for the blog API.
//!
//! - Structured logging setup (text or JSON)
//! - Prometheus metrics recorder and exposition handler

mod logging;
mod metrics;

pub use logging::{create_json_subscriber, init_logging, LoggingConfig};
pub use metrics::{init_metrics, metrics_handler, MetricsError, MetricsState};

#[cfg(test)]
pub(crate) use logging::CaptureWriter;
