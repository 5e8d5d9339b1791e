//! Builder for configuring [`MokaBackend`].

use std::time::Duration;

use keepsake_core::{BackendLabel, CacheEntry, CacheKey};
use moka::future::{Cache, CacheBuilder};
#[cfg(feature = "metrics")]
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;

use crate::backend::MokaBackend;
#[cfg(feature = "metrics")]
use crate::metrics;

/// Marker type: capacity has not been configured yet.
///
/// This is the initial state of a [`MokaBackendBuilder`]. You must call either
/// [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Capacity is set with exactly one of [`max_entries`](Self::max_entries) or
/// [`max_bytes`](Self::max_bytes); `build()` only exists after one of them.
///
/// ```
/// use std::time::Duration;
/// use keepsake_moka::{EvictionPolicy, MokaBackend};
///
/// let backend = MokaBackend::builder()
///     .max_entries(5_000)
///     .eviction_policy(EvictionPolicy::lru())
///     .retention(Duration::from_secs(7 * 24 * 3600))
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap> {
    capacity: Cap,
    label: BackendLabel,
    eviction_policy: Option<EvictionPolicy>,
    retention: Option<Duration>,
}

impl MokaBackendBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: BackendLabel::new_static("moka"),
            eviction_policy: None,
            retention: None,
        }
    }

    /// Sets the maximum number of entries the cache can hold.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity> {
        self.with_capacity(EntryCapacity(capacity))
    }

    /// Sets the maximum memory budget in bytes.
    ///
    /// The byte count is the estimated size of the key plus status, headers
    /// and body of the stored response.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity> {
        self.with_capacity(ByteCapacity(bytes))
    }

    fn with_capacity<Cap>(self, capacity: Cap) -> MokaBackendBuilder<Cap> {
        MokaBackendBuilder {
            capacity,
            label: self.label,
            eviction_policy: self.eviction_policy,
            retention: self.retention,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaBackendBuilder<Cap> {
    /// Sets a custom label, used in metrics and logs.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy used when the cache reaches capacity.
    ///
    /// # Default
    ///
    /// - **Entry-based capacity**: [`EvictionPolicy::tiny_lfu()`]
    /// - **Byte-based capacity**: [`EvictionPolicy::lru()`], since TinyLFU's
    ///   admission policy can reject large responses even when eviction
    ///   could make room
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Drops entries this long after they were written, stale or not.
    ///
    /// Without retention entries live until evicted by capacity.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    fn finish(
        label: BackendLabel,
        retention: Option<Duration>,
        capacity: u64,
        builder: CacheBuilder<CacheKey, CacheEntry, Cache<CacheKey, CacheEntry>>,
    ) -> MokaBackend {
        let builder = match retention {
            Some(retention) => builder.time_to_live(retention),
            None => builder,
        };
        #[cfg(feature = "metrics")]
        let builder = {
            let backend = label.as_str().to_owned();
            builder.eviction_listener(move |_key, _entry, cause| {
                if let Some(cause) = eviction_cause(cause) {
                    metrics::record_eviction(&backend, cause);
                }
            })
        };
        MokaBackend {
            cache: builder.build(),
            label,
            capacity,
        }
    }
}

impl MokaBackendBuilder<EntryCapacity> {
    /// Builds the [`MokaBackend`] with entry-count based capacity.
    pub fn build(self) -> MokaBackend {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let builder = CacheBuilder::new(self.capacity.0).eviction_policy(policy);
        Self::finish(self.label, self.retention, self.capacity.0, builder)
    }
}

impl MokaBackendBuilder<ByteCapacity> {
    /// Builds the [`MokaBackend`] with byte-based capacity.
    pub fn build(self) -> MokaBackend {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let builder = CacheBuilder::new(self.capacity.0)
            .weigher(Self::byte_weigher)
            .eviction_policy(policy);
        Self::finish(self.label, self.retention, self.capacity.0, builder)
    }

    /// Approximate byte cost of a cache entry.
    fn byte_weigher(key: &CacheKey, entry: &CacheEntry) -> u32 {
        (key.memory_size() + entry.memory_size()).min(u32::MAX as usize) as u32
    }
}

/// Metrics label for removals the store decided on; `None` for overwrites and
/// explicit invalidation.
#[cfg(feature = "metrics")]
fn eviction_cause(cause: RemovalCause) -> Option<&'static str> {
    match cause {
        RemovalCause::Size => Some("size"),
        RemovalCause::Expired => Some("retention"),
        RemovalCause::Replaced | RemovalCause::Explicit => None,
    }
}
