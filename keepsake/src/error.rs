use keepsake_core::{Payload, UpstreamError};
use thiserror::Error;

/// Error of a fetch that produced no usable response.
///
/// A failure that could be covered by a stale entry is not an error: it is
/// reported through [`FetchOutcome::error`](crate::FetchOutcome::error) instead.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The upstream answered 4xx and nothing was stored for the request.
    #[error("resource not found at {url} (status {})", .response.status)]
    NotFound {
        /// Requested URL.
        url: String,
        /// The upstream response, body included.
        response: Payload,
    },
    /// The upstream failed and nothing was stored for the request.
    #[error("failed to fetch {url}: {source}")]
    HardFailure {
        /// Requested URL.
        url: String,
        /// What went wrong.
        #[source]
        source: UpstreamError,
    },
    /// The URL given to a string convenience method did not parse.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// Returns `true` for [`FetchError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    /// The upstream response that caused the error, if there was one.
    pub fn response(&self) -> Option<&Payload> {
        match self {
            FetchError::NotFound { response, .. } => Some(response),
            FetchError::HardFailure { source, .. } => source.payload(),
            FetchError::InvalidUrl(_) => None,
        }
    }

    /// Short machine-readable kind, as used in metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound { .. } => "not_found",
            FetchError::HardFailure { source, .. } => source.kind(),
            FetchError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Rejected fetch policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Every upstream attempt needs a non-zero timeout.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    /// A transient status outside `100..=599`.
    #[error("invalid HTTP status code in retry policy: {0}")]
    InvalidStatus(u16),
}
