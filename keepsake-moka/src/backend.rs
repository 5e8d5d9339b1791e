//! Moka backend implementation.

use async_trait::async_trait;
use keepsake_backend::{Backend, BackendResult};
use keepsake_core::{BackendLabel, CacheEntry, CacheKey};
use moka::future::Cache;

use crate::builder::{MokaBackendBuilder, NoCapacity};
use crate::metrics;

/// In-memory cache store powered by Moka.
///
/// Reads are lock-free and writes use fine-grained locking, so the store
/// can be shared by any number of concurrent fetches. Cloning is cheap and
/// clones share the same cache.
///
/// # Examples
///
/// ```
/// use keepsake_moka::MokaBackend;
///
/// // At most 100 MB of responses
/// let backend = MokaBackend::builder()
///     .max_bytes(100 * 1024 * 1024)
///     .label("cms")
///     .build();
/// ```
#[derive(Clone)]
pub struct MokaBackend {
    pub(crate) cache: Cache<CacheKey, CacheEntry>,
    pub(crate) label: BackendLabel,
    /// Configured limit, in entries or in bytes.
    pub(crate) capacity: u64,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder. Capacity must be set before `build()`.
    pub fn builder() -> MokaBackendBuilder<NoCapacity> {
        MokaBackendBuilder::new()
    }

    /// Weighted size over configured capacity, between 0 and about 1.
    ///
    /// Entry-bounded stores weigh every entry as 1, so this is the entry count
    /// over `max_entries`. Byte-bounded stores compare estimated bytes with
    /// `max_bytes`. Moka applies evictions lazily, so the ratio can briefly
    /// exceed 1 after a burst of writes.
    pub fn usage_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.cache.weighted_size() as f64 / self.capacity as f64
    }

    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, CacheEntry> {
        &self.cache
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        self.cache.insert(key.clone(), entry).await;
        metrics::record_usage(
            self.label.as_str(),
            self.cache.entry_count(),
            self.usage_ratio(),
        );
        Ok(())
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
