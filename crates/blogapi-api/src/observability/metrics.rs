//! Prometheus metrics recorder and exposition.
//!
//! # Metrics Exposed
//!
//! - `blogapi_http_requests_total` - HTTP requests by method, route, status class
//! - `blogapi_http_request_duration_seconds` - HTTP request duration histogram
//! - `blogapi_storage_query_duration_seconds` - storage query duration by backend, operation, status
//! - `blogapi_storage_query_timeout_total` - storage queries that hit the query timeout

use std::sync::Arc;

use axum::{extract::State, http::header::CONTENT_TYPE, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Shared handle used to render the exposition text.
#[derive(Clone)]
pub struct MetricsState {
    handle: Arc<PrometheusHandle>,
}

impl MetricsState {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Current metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to install Prometheus recorder: recorder already installed")]
    AlreadyInstalled,
}

/// Installs the process-wide Prometheus recorder.
///
/// # Errors
///
/// Fails if a recorder is already installed.
pub fn init_metrics() -> Result<MetricsState, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|_| MetricsError::AlreadyInstalled)?;

    describe_metrics();

    Ok(MetricsState::new(handle))
}

fn describe_metrics() {
    metrics::describe_counter!(
        "blogapi_http_requests_total",
        "Total number of HTTP requests"
    );
    metrics::describe_histogram!(
        "blogapi_http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request duration in seconds"
    );
    metrics::describe_histogram!(
        "blogapi_storage_query_duration_seconds",
        metrics::Unit::Seconds,
        "Storage query duration in seconds by backend, operation and status"
    );
    metrics::describe_counter!(
        "blogapi_storage_query_timeout_total",
        "Total number of storage queries that exceeded the query timeout"
    );
}

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Handler for the metrics endpoint.
pub async fn metrics_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], state.render())
}
