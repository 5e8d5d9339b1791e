//! Error types for store operations.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal store error, state or I/O failure.
    #[error(transparent)]
    InternalError(BoxError),

    /// A stored entry could not be encoded or decoded.
    #[error("cache entry codec error: {0}")]
    CodecError(#[source] BoxError),
}

impl BackendError {
    /// Wraps any error as an [`InternalError`](BackendError::InternalError).
    pub fn internal(error: impl Into<BoxError>) -> Self {
        BackendError::InternalError(error.into())
    }

    /// Wraps any error as a [`CodecError`](BackendError::CodecError).
    pub fn codec(error: impl Into<BoxError>) -> Self {
        BackendError::CodecError(error.into())
    }
}
