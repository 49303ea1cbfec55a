use group_types::GroupError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for GroupError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => GroupError::NotFound(what),
            other => GroupError::Storage(other.to_string()),
        }
    }
}
