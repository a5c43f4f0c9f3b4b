//! Error types for the index crate.

use rkv_types::IndexValue;

/// Errors that can occur while building index or key-filter queries.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Range bounds of different types can never both hold.
    #[error("range bounds have different types: {low:?} .. {high:?}")]
    MismatchedBounds { low: IndexValue, high: IndexValue },

    /// A key filter was not a `[name, argument]` pair.
    #[error("malformed key filter: {0}")]
    MalformedFilter(String),

    /// A key filter argument had the wrong shape.
    #[error("invalid argument for key filter {filter}: {reason}")]
    InvalidArgument { filter: String, reason: String },
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
