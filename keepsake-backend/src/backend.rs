use std::sync::Arc;

use async_trait::async_trait;
use keepsake_core::{BackendLabel, CacheEntry, CacheKey};

use crate::{BackendError, metrics};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw key-value store operations.
///
/// Implementations must be safe for concurrent use. Writes to the same key
/// may race; the last writer wins.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Returns the entry stored under `key`, or `None` when absent.
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>>;

    /// Stores `entry` under `key`, replacing any previous entry.
    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()>;

    /// Returns the label used for metrics and logs.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        (*self).write(key, entry).await
    }

    fn label(&self) -> BackendLabel {
        (*self).label()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        (**self).write(key, entry).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        (**self).write(key, entry).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

/// Store operations with metrics and logging.
///
/// `get` and `set` wrap [`Backend::read`] and [`Backend::write`], recording
/// operation counts, durations and errors under the store's label.
#[async_trait]
pub trait CacheBackend: Backend {
    /// Reads `key`, recording read metrics.
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        let label = self.label();
        let timer = metrics::Timer::new();
        let result = self.read(key).await;
        metrics::record_read(label.as_str(), timer.elapsed());

        if let Err(error) = &result {
            metrics::record_read_error(label.as_str());
            tracing::warn!(backend = %label, %key, %error, "cache read failed");
        }
        result
    }

    /// Writes `entry` under `key`, recording write metrics.
    async fn set(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        let label = self.label();
        let timer = metrics::Timer::new();
        let result = self.write(key, entry).await;
        metrics::record_write(label.as_str(), timer.elapsed());

        if let Err(error) = &result {
            metrics::record_write_error(label.as_str());
            tracing::warn!(backend = %label, %key, %error, "cache write failed");
        }
        result
    }
}

impl<B: Backend + ?Sized> CacheBackend for B {}
