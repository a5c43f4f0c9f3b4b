use thiserror::Error;

/// A failure raised by caller-supplied map or comparator code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransformError(String);

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum MapReduceError {
    /// Missing selector fields, or a reduce/filter argument of the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The map function failed on one object.
    #[error("map transform failed on key {key}: {source}")]
    TransformFailure {
        key: String,
        #[source]
        source: TransformError,
    },

    #[error("store error: {0}")]
    Store(#[from] rkv_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] rkv_index::IndexError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MapReduceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

pub type MapReduceResult<T> = Result<T, MapReduceError>;
