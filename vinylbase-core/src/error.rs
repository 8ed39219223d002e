// vinylbase-core/src/error.rs
// Error taxonomy for the store client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VinylBaseError>;

/// VinylBase error type
///
/// Variants fall into the classes the driver program cares about:
/// - Connection class (`Connection`, `InvalidUri`, `DeadlineExceeded`, `Io`):
///   fatal at connect/ping time
/// - `Write` / `Read`: per-operation failures, logged and skipped
/// - Storage-internal conditions (`CollectionNotFound`, `CollectionExists`,
///   `DuplicateId`, `Serialization`) surface through the classes above
///
/// "Not found" outcomes are `Option::None` or a zero count, never an error.
#[derive(Error, Debug)]
pub enum VinylBaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid store URI: {0}")]
    InvalidUri(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Duplicate _id: {0}")]
    DuplicateId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for VinylBaseError {
    fn from(err: serde_json::Error) -> Self {
        VinylBaseError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VinylBaseError::CollectionNotFound("albums".to_string());
        assert_eq!(err.to_string(), "Collection not found: albums");

        let err = VinylBaseError::DeadlineExceeded;
        assert_eq!(err.to_string(), "Deadline exceeded");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VinylBaseError = io_err.into();
        assert!(matches!(err, VinylBaseError::Io(_)));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err: VinylBaseError = serde_err.into();
        assert!(matches!(err, VinylBaseError::Serialization(_)));
    }
}
