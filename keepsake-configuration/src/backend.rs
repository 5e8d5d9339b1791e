use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use keepsake::backend::Backend as BackendTrait;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// In-memory store settings.
///
/// Capacity is either `max_entries` or `max_bytes`, never both. With neither
/// set the store holds up to 10 000 entries.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Moka {
    /// Maximum number of stored responses.
    #[serde(default)]
    pub max_entries: Option<u64>,
    /// Maximum total size of stored responses, e.g. `64 MiB`.
    #[serde(default)]
    pub max_bytes: Option<ByteSize>,
    /// Drop entries this long after they were written.
    #[serde(default, with = "humantime_serde")]
    pub retention: Option<Duration>,
    /// Optional label for this backend (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// Persistent store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FeOxDb {
    /// Database file. Memory-only when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Upper bound for the database file.
    #[serde(default)]
    pub max_file_size: Option<ByteSize>,
    /// Upper bound for the in-memory index and cache.
    #[serde(default)]
    pub max_memory: Option<ByteSize>,
    /// Drop entries this long after they were written.
    #[serde(default, with = "humantime_serde")]
    pub retention: Option<Duration>,
    /// Optional label for this backend (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// Which store keeps fetched responses.
///
/// ```yaml
/// type: FeOxDb
/// path: cache.db
/// max_file_size: 1 GiB
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Backend {
    /// Bounded in-memory store.
    Moka(Moka),
    /// Disk-persistent store.
    FeOxDb(FeOxDb),
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Moka(Moka::default())
    }
}

impl Backend {
    /// Resolves a relative database path against `dir`.
    pub(crate) fn resolve_paths(&mut self, dir: &Path) {
        if let Backend::FeOxDb(FeOxDb {
            path: Some(path), ..
        }) = self
            && path.is_relative()
        {
            *path = dir.join(&*path);
        }
    }

    /// Builds the configured store.
    pub fn into_backend(self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        match self {
            Backend::Moka(config) => config.into_backend(),
            Backend::FeOxDb(config) => config.into_backend(),
        }
    }
}

impl Moka {
    /// Builds the in-memory store.
    #[cfg(feature = "moka")]
    pub fn into_backend(self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        use keepsake_moka::{MokaBackend, MokaBackendBuilder};

        fn configure<Cap>(
            mut builder: MokaBackendBuilder<Cap>,
            label: Option<String>,
            retention: Option<Duration>,
        ) -> MokaBackendBuilder<Cap> {
            if let Some(label) = label {
                builder = builder.label(label);
            }
            if let Some(retention) = retention {
                builder = builder.retention(retention);
            }
            builder
        }

        let backend = match (self.max_entries, self.max_bytes) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidBackend(
                    "Moka takes either max_entries or max_bytes, not both",
                ));
            }
            (None, Some(bytes)) => configure(
                MokaBackend::builder().max_bytes(bytes.as_u64()),
                self.label,
                self.retention,
            )
            .build(),
            (entries, None) => configure(
                MokaBackend::builder().max_entries(entries.unwrap_or(DEFAULT_MAX_ENTRIES)),
                self.label,
                self.retention,
            )
            .build(),
        };

        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "moka"))]
    pub fn into_backend(self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        Err(ConfigError::BackendNotAvailable("Moka".to_string()))
    }
}

impl FeOxDb {
    /// Opens the persistent store.
    #[cfg(feature = "feoxdb")]
    pub fn into_backend(self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        use keepsake_feoxdb::FeOxDbBackend;

        let mut builder = FeOxDbBackend::builder();

        if let Some(path) = self.path {
            builder = builder.path(path);
        }
        if let Some(size) = self.max_file_size {
            builder = builder.max_file_size(size.as_u64());
        }
        if let Some(memory) = self.max_memory {
            let memory = usize::try_from(memory.as_u64())
                .map_err(|_| ConfigError::InvalidBackend("max_memory exceeds the address space"))?;
            builder = builder.max_memory(memory);
        }
        if let Some(retention) = self.retention {
            builder = builder.retention(retention);
        }
        if let Some(label) = self.label {
            builder = builder.label(label);
        }

        let backend = builder
            .build()
            .map_err(|e| ConfigError::BackendNotAvailable(format!("FeOxDb: {}", e)))?;

        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "feoxdb"))]
    pub fn into_backend(self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        Err(ConfigError::BackendNotAvailable("FeOxDb".to_string()))
    }
}
