use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] rkv_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] rkv_index::IndexError),

    #[error("invalid index value: {0}")]
    IndexValue(#[from] rkv_types::TypeError),

    #[error("map/reduce error: {0}")]
    MapReduce(#[from] rkv_mapred::MapReduceError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            Self::MapReduce(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Not found is 404; everything else is a generic 500.
    pub fn status_code(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status == StatusCode::NOT_FOUND {
            "not found".to_string()
        } else {
            warn!(error = %self, "request failed");
            self.to_string()
        };
        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
