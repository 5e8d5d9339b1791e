//! The network seam.
//!
//! [`Upstream`] is anything that can turn a [`FetchRequest`] into a
//! [`Payload`]. `keepsake-reqwest` implements it over HTTP, `keepsake`
//! wraps any implementation with retries, and tests script it directly.
//!
//! Implementations return `Ok` for every response the server produced,
//! whatever its status. Only the retry layer turns an exhausted 5xx into
//! [`UpstreamError::Status`].

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::entry::Payload;
use crate::request::FetchRequest;

type BoxError = Box<dyn StdError + Send + Sync>;
type SharedError = Arc<dyn StdError + Send + Sync>;

/// Failure of an upstream call.
///
/// Cheap to clone: transport errors are shared, so one failed call can be
/// reported to every caller that waited on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream kept answering with a transient status.
    #[error("upstream responded with status {}", .0.status)]
    Status(Payload),
    /// An attempt did not complete within its timeout.
    #[error("upstream request timed out: {0}")]
    Timeout(#[source] SharedError),
    /// The connection could not be established.
    #[error("upstream connection failed: {0}")]
    Connect(#[source] SharedError),
    /// Any other transport failure.
    #[error("upstream request failed: {0}")]
    Other(#[source] SharedError),
}

impl UpstreamError {
    /// An attempt that ran out of time.
    pub fn timeout(error: impl Into<BoxError>) -> Self {
        UpstreamError::Timeout(Arc::from(error.into()))
    }

    /// A connection that could not be established.
    pub fn connect(error: impl Into<BoxError>) -> Self {
        UpstreamError::Connect(Arc::from(error.into()))
    }

    /// Any other transport failure.
    pub fn other(error: impl Into<BoxError>) -> Self {
        UpstreamError::Other(Arc::from(error.into()))
    }

    /// Short machine-readable kind, used as the `error` metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Status(payload) if payload.is_server_error() => "status_5xx",
            UpstreamError::Status(_) => "status_other",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Connect(_) => "connect",
            UpstreamError::Other(_) => "other",
        }
    }

    /// Returns the final response, for status failures.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            UpstreamError::Status(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Trait for calling the upstream API.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use http::StatusCode;
/// use keepsake_core::{FetchRequest, Payload, Upstream, UpstreamError};
///
/// struct Static;
///
/// #[async_trait]
/// impl Upstream for Static {
///     async fn call(&self, _request: &FetchRequest) -> Result<Payload, UpstreamError> {
///         Ok(Payload::from_status(StatusCode::OK, "[]"))
///     }
/// }
/// ```
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Sends `request` once and returns the response, whatever its status.
    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError>;
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for &U {
    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        (**self).call(request).await
    }
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for Box<U> {
    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        (**self).call(request).await
    }
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for Arc<U> {
    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        (**self).call(request).await
    }
}
