//! Storage error types.

use std::time::Duration;

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The engine rejected a write because it would break a constraint
    /// (unique key, foreign key, not-null, check).
    #[error("integrity violation: {message}")]
    IntegrityViolation { message: String },

    /// Database connection error.
    #[error("database connection error: {message}")]
    ConnectionError { message: String },

    /// Database query error.
    #[error("database query error: {message}")]
    QueryError { message: String },

    /// Transaction error (begin, commit or rollback failed).
    #[error("transaction error: {message}")]
    TransactionError { message: String },

    /// Query exceeded its time budget.
    #[error("query timeout after {timeout:?} during {operation}")]
    QueryTimeout {
        operation: String,
        timeout: Duration,
    },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

impl StorageError {
    /// Classifies a sqlx error raised while running `operation`.
    ///
    /// Constraint breaches become [`StorageError::IntegrityViolation`] so the
    /// API can answer 409; pool exhaustion and I/O failures become
    /// [`StorageError::ConnectionError`]; everything else is a query error.
    pub(crate) fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => StorageError::IntegrityViolation {
                    message: db_err.message().to_string(),
                },
                _ => StorageError::QueryError {
                    message: format!("{operation}: {err}"),
                },
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::ConnectionError {
                    message: format!("{operation}: {err}"),
                }
            }
            _ => StorageError::QueryError {
                message: format!("{operation}: {err}"),
            },
        }
    }

    /// Returns true when the error is a constraint breach.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, StorageError::IntegrityViolation { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Runs a query future under `timeout` and records its duration.
///
/// # Metrics
/// - `blogapi_storage_query_duration_seconds` - Histogram of query durations
/// - `blogapi_storage_query_timeout_total` - Counter of timeout events
pub(crate) async fn timed_query<T, F>(
    backend: &'static str,
    operation: &'static str,
    timeout: Duration,
    future: F,
) -> StorageResult<T>
where
    F: std::future::Future<Output = StorageResult<T>>,
{
    let start = std::time::Instant::now();
    let result = tokio::time::timeout(timeout, future).await;
    let duration = start.elapsed().as_secs_f64();

    let (status, final_result) = match result {
        Ok(Ok(value)) => ("success", Ok(value)),
        Ok(Err(e)) => ("error", Err(e)),
        Err(_elapsed) => (
            "timeout",
            Err(StorageError::QueryTimeout {
                operation: operation.to_string(),
                timeout,
            }),
        ),
    };

    metrics::histogram!(
        "blogapi_storage_query_duration_seconds",
        "operation" => operation,
        "backend" => backend,
        "status" => status
    )
    .record(duration);

    if status == "timeout" {
        metrics::counter!(
            "blogapi_storage_query_timeout_total",
            "operation" => operation,
            "backend" => backend
        )
        .increment(1);
    }

    final_result
}
