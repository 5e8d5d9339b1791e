//! Simple in-memory test stores.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use keepsake_backend::{Backend, BackendError, BackendResult};
use keepsake_core::{BackendLabel, CacheEntry, CacheKey};

/// In-memory store backed by DashMap. Clones share storage.
#[derive(Clone, Default)]
pub struct TestBackend {
    store: Arc<DashMap<CacheKey, CacheEntry>>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        Ok(self.store.get(key).map(|v| v.clone()))
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry) -> BackendResult<()> {
        self.store.insert(key.clone(), entry);
        Ok(())
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("test")
    }
}

/// Store whose every operation fails.
pub struct BrokenBackend;

#[async_trait]
impl Backend for BrokenBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        Err(BackendError::internal("disk on fire"))
    }

    async fn write(&self, _key: &CacheKey, _entry: CacheEntry) -> BackendResult<()> {
        Err(BackendError::internal("disk on fire"))
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("broken")
    }
}
