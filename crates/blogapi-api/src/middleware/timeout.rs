//! Request timeout answered with the JSON error envelope.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::errors::ApiError;

/// Runs the rest of the stack under `timeout`; on expiry the request is
/// dropped, which rolls back any open unit of work, and 408 is returned.
///
/// Mount with `axum::middleware::from_fn_with_state(timeout, enforce_timeout)`.
pub async fn enforce_timeout(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(
                method = %method,
                path = %path,
                timeout_ms = timeout.as_millis() as u64,
                "Request timed out"
            );
            ApiError::request_timeout().into_response()
        }
    }
}
