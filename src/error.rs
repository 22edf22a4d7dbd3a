//! Error types for Depot.

use thiserror::Error;

/// Common error type for Depot.
#[derive(Error, Debug)]
pub enum DepotError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from the
    /// backing store. Database errors from sqlx are automatically
    /// converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A chunk was missing when an upload was finalized.
    ///
    /// The client must resend the missing chunk and retry finalize.
    #[error("upload is incomplete: chunk {index} is missing")]
    IncompleteUpload {
        /// First missing chunk index.
        index: u32,
    },

    /// Duplicate identifier on insert.
    ///
    /// Identifiers are generated server-side, so this indicates an
    /// invariant violation rather than a caller mistake.
    #[error("duplicate identifier: {0}")]
    Duplicate(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for DepotError {
    fn from(e: sqlx::Error) -> Self {
        DepotError::Database(e.to_string())
    }
}

/// Result type alias for Depot operations.
pub type Result<T> = std::result::Result<T, DepotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DepotError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_incomplete_upload_display() {
        let err = DepotError::IncompleteUpload { index: 3 };
        assert_eq!(err.to_string(), "upload is incomplete: chunk 3 is missing");
    }

    #[test]
    fn test_duplicate_display() {
        let err = DepotError::Duplicate("abc".to_string());
        assert_eq!(err.to_string(), "duplicate identifier: abc");
    }

    #[test]
    fn test_validation_display() {
        let err = DepotError::Validation("file name is empty".to_string());
        assert_eq!(err.to_string(), "validation error: file name is empty");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DepotError = io_err.into();
        assert!(matches!(err, DepotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(DepotError::Validation("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
