use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid integer value for index {index}: {value:?}")]
    InvalidInteger { index: String, value: String },

    #[error("unsupported index value: {0}")]
    UnsupportedIndexValue(String),
}
