use std::path::PathBuf;

use keepsake::PolicyError;
use thiserror::Error;

/// Errors raised while loading a [`SiteConfig`](crate::SiteConfig) or
/// building what it describes.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The selected backend was compiled out or failed to start.
    #[error("backend not available: {0}")]
    BackendNotAvailable(String),

    /// The backend section contradicts itself.
    #[error("invalid backend configuration: {0}")]
    InvalidBackend(&'static str),

    /// The fetch section was rejected by the fetcher.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}
