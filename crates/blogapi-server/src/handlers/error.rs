//! Error type shared by the entity handlers.

use blogapi_storage::StorageError;

use super::types::BulkRowError;

/// Errors surfaced by the handlers.
///
/// By the time one of these reaches the caller, the unit of work that
/// produced it has already been rolled back.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Malformed input, or a referenced related id that does not exist.
    #[error("{message}")]
    Validation { message: String },

    /// The primary id of the operation does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The storage engine rejected a write with a constraint violation.
    #[error("data conflict: {message}")]
    Conflict { message: String },

    /// One or more rows of a bulk create were rejected; nothing was stored.
    #[error("bulk creation failed for {} row(s)", errors.len())]
    BulkCreate { errors: Vec<BulkRowError> },

    /// A pluggable method failed or is not registered.
    #[error("Method execution failed: {message}")]
    Internal { message: String },

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for HandlerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IntegrityViolation { message } => HandlerError::Conflict { message },
            other => HandlerError::Storage(other),
        }
    }
}

/// Result type for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_violation_becomes_conflict() {
        let err: HandlerError = StorageError::IntegrityViolation {
            message: "fk".to_string(),
        }
        .into();
        assert!(matches!(err, HandlerError::Conflict { ref message } if message == "fk"));
    }

    #[test]
    fn test_other_storage_errors_are_kept() {
        let err: HandlerError = StorageError::QueryError {
            message: "syntax".to_string(),
        }
        .into();
        assert!(matches!(err, HandlerError::Storage(StorageError::QueryError { .. })));
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let err = HandlerError::NotFound {
            entity: "BlogPost",
            id: 3,
        };
        assert_eq!(err.to_string(), "BlogPost not found");
    }
}
