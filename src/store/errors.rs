//! Storage error types.

use thiserror::Error;

use super::RecordKey;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record at the given key
    #[error("record not found: {0}")]
    NotFound(RecordKey),

    /// Backend failure (lock poisoning, I/O, ...)
    #[error("storage backend error: {0}")]
    Backend(String),
}
