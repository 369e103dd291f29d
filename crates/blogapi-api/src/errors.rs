//! Uniform JSON error envelope for every HTTP failure.
//!
//! Every error leaves the service as
//!
//! ```json
//! {"error": "Not Found", "message": "BlogPost not found", "detail": "HTTP 404 error occurred"}
//! ```
//!
//! `error` is the canonical reason phrase of the status code, `message` is
//! the human readable cause and `detail` is either a string or, for bulk
//! creation failures, an object listing the rejected rows.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blogapi_server::HandlerError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

/// Detail attached to request payloads that could not be decoded.
pub const INVALID_INPUT_DETAIL: &str = "Invalid input data provided";

/// API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub message: String,
    pub detail: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            status,
            error: reason(status),
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// An error whose detail only repeats the status code.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(
            status,
            message,
            format!("HTTP {} error occurred", status.as_u16()),
        )
    }

    /// A request body, path or query that failed to decode.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, INVALID_INPUT_DETAIL)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::NOT_FOUND, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn request_timeout() -> Self {
        Self::from_status(StatusCode::REQUEST_TIMEOUT, "Request timed out")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "An internal server error occurred",
        )
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("HTTP Error").to_string()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<HandlerError> for ApiError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Validation { message } => {
                ApiError::from_status(StatusCode::BAD_REQUEST, message)
            }
            HandlerError::NotFound { .. } => ApiError::not_found(err.to_string()),
            HandlerError::Conflict { message } => {
                error!(error = %message, "Database integrity error");
                ApiError::new(StatusCode::CONFLICT, "Data conflict occurred", message)
            }
            HandlerError::BulkCreate { errors } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "Bulk creation failed",
                json!({ "errors": errors }),
            ),
            HandlerError::Internal { message } => {
                ApiError::internal(format!("Method execution failed: {message}"))
            }
            HandlerError::Storage(storage) => {
                error!(error = %storage, "Database error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed",
                    "An internal database error occurred",
                )
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
