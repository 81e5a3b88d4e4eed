//! # Query Errors

use thiserror::Error;

/// Result type for query parsing
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Filter does not follow `<field><op><value>`
    #[error("Incorrectly formatted filter: {0}")]
    InvalidFilter(String),

    /// Order field is empty or contains characters outside `[\w\-.]`
    #[error("Incorrectly formatted order: {0}")]
    InvalidOrder(String),

    /// AND/OR composite filters
    #[error("Composite filters like OR/AND are not supported: {0}")]
    CompositeUnsupported(String),

    /// The `params` query form
    #[error("Query by params, not yet supported.")]
    ParamsUnsupported,
}
