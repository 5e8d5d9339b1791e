use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bincode::{
    config::standard as bincode_config,
    serde::{decode_from_slice, encode_to_vec},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use feoxdb::{FeoxError, FeoxStore};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use keepsake_backend::{Backend, BackendError, BackendResult};
use keepsake_core::{BackendLabel, CacheEntry, CacheKey, Payload};
use serde::{Deserialize, Serialize};

use crate::FeOxDbError;

#[derive(Serialize, Deserialize)]
struct SerializableHeader {
    name: String,
    #[serde(with = "serde_bytes")]
    value: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct SerializableEntry {
    stored_at: DateTime<Utc>,
    status: u16,
    headers: Vec<SerializableHeader>,
    #[serde(with = "serde_bytes")]
    body: Vec<u8>,
}

impl From<&CacheEntry> for SerializableEntry {
    fn from(entry: &CacheEntry) -> Self {
        let payload = entry.payload();
        Self {
            stored_at: entry.stored_at(),
            status: payload.status.as_u16(),
            headers: payload
                .headers
                .iter()
                .map(|(name, value)| SerializableHeader {
                    name: name.as_str().to_owned(),
                    value: value.as_bytes().to_vec(),
                })
                .collect(),
            body: payload.body.to_vec(),
        }
    }
}

impl TryFrom<SerializableEntry> for CacheEntry {
    type Error = FeOxDbError;

    fn try_from(value: SerializableEntry) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(value.status)
            .map_err(|e| FeOxDbError::Corrupted(e.to_string()))?;

        let mut headers = HeaderMap::with_capacity(value.headers.len());
        for header in value.headers {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| FeOxDbError::Corrupted(e.to_string()))?;
            let value = HeaderValue::from_bytes(&header.value)
                .map_err(|e| FeOxDbError::Corrupted(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(CacheEntry::new(
            Payload::new(status, headers, Bytes::from(value.body)),
            value.stored_at,
        ))
    }
}

fn encode_entry(entry: &CacheEntry) -> Result<Vec<u8>, FeOxDbError> {
    Ok(encode_to_vec(SerializableEntry::from(entry), bincode_config())?)
}

fn decode_entry(bytes: &[u8]) -> Result<CacheEntry, FeOxDbError> {
    let (serializable, _): (SerializableEntry, _) = decode_from_slice(bytes, bincode_config())?;
    serializable.try_into()
}

/// Disk-based cache store using FeOxDB.
///
/// Use this when cached responses must survive restarts or don't fit in memory.
/// For pure speed without persistence, prefer `MokaBackend`.
///
/// ```no_run
/// use keepsake_feoxdb::FeOxDbBackend;
///
/// // With resource limits
/// let backend = FeOxDbBackend::builder()
///     .path("/var/cache/site")
///     .max_file_size(10 * 1024 * 1024 * 1024)  // 10 GB
///     .max_memory(256 * 1024 * 1024)           // 256 MB
///     .build()?;
/// # Ok::<(), keepsake_feoxdb::FeOxDbError>(())
/// ```
///
/// Clones share the same underlying database.
#[derive(Clone)]
pub struct FeOxDbBackend {
    store: Arc<FeoxStore>,
    retention: Option<Duration>,
    label: BackendLabel,
}

impl FeOxDbBackend {
    /// Starts building a new backend.
    pub fn builder() -> FeOxDbBackendBuilder {
        FeOxDbBackendBuilder::default()
    }

    /// In-memory backend, mostly for tests.
    ///
    /// Data is lost when dropped. Equivalent to `builder().build()`.
    ///
    /// ```
    /// use keepsake_feoxdb::FeOxDbBackend;
    ///
    /// let backend = FeOxDbBackend::in_memory()
    ///     .expect("Failed to create in-memory backend");
    /// ```
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }

    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes in memory and flushes them periodically (~100ms).
    /// No-op in memory-only mode.
    pub fn flush(&self) {
        self.store.flush();
    }

    fn key_bytes(key: &CacheKey) -> Vec<u8> {
        key.to_string().into_bytes()
    }

    fn retained(&self, entry: &CacheEntry) -> bool {
        self.retention
            .is_none_or(|retention| entry.age(Utc::now()) <= retention)
    }
}

/// Builder for [`FeOxDbBackend`].
pub struct FeOxDbBackendBuilder {
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    retention: Option<Duration>,
    label: BackendLabel,
}

impl Default for FeOxDbBackendBuilder {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            retention: None,
            label: BackendLabel::new_static("feoxdb"),
        }
    }
}

impl FeOxDbBackendBuilder {
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory and is lost on restart.
    /// If path is a directory, creates `cache.db` inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Writes fail with `OutOfSpace` when full. Ignored in memory-only mode.
    ///
    /// Default: 1 GB
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage.
    ///
    /// In memory-only mode, this is your total cache capacity.
    /// In persistent mode, this limits the read cache for disk data.
    /// FeOxDB has no automatic eviction; writes fail with `OutOfMemory`
    /// when the limit is reached.
    ///
    /// Default: 1 GB
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Drops entries this long after they were written, stale or not.
    ///
    /// Without retention entries are kept until overwritten.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Identifies this backend in metrics and logs.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Creates the backend.
    ///
    /// Fails if the database file can't be opened or created.
    pub fn build(self) -> Result<FeOxDbBackend, FeOxDbError> {
        let mut builder = FeoxStore::builder().enable_ttl(true);

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("cache.db");
            }
            let path_str = path.to_string_lossy().to_string();
            builder = builder.device_path(path_str);
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;

        Ok(FeOxDbBackend {
            store: Arc::new(store),
            retention: self.retention,
            label: self.label,
        })
    }
}

#[async_trait]
impl Backend for FeOxDbBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        let store = self.store.clone();
        let key_bytes = Self::key_bytes(key);

        let entry = tokio::task::spawn_blocking(move || match store.get(&key_bytes) {
            Ok(encoded) => decode_entry(&encoded)
                .map(Some)
                .map_err(BackendError::codec),
            Err(FeoxError::KeyNotFound) => Ok(None),
            Err(e) => Err(BackendError::internal(FeOxDbError::from(e))),
        })
        .await
        .map_err(BackendError::internal)??;

        Ok(entry.filter(|entry| self.retained(entry)))
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        let store = self.store.clone();
        let key_bytes = Self::key_bytes(key);
        let value_bytes = encode_entry(&entry).map_err(BackendError::codec)?;
        // FeOxDB TTLs have whole-second resolution; reads filter precisely.
        let ttl_secs = self.retention.map(|retention| retention.as_secs().max(1));

        tokio::task::spawn_blocking(move || {
            ttl_secs
                .map(|ttl_secs| store.insert_with_ttl(&key_bytes, &value_bytes, ttl_secs))
                .unwrap_or_else(|| store.insert(&key_bytes, &value_bytes))
                .map_err(|e| BackendError::internal(FeOxDbError::from(e)))?;
            Ok(())
        })
        .await
        .map_err(BackendError::internal)?
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
