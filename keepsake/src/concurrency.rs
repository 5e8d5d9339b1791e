//! Per-key coalescing of refreshes.
//!
//! Concurrent fetches of the same missing or expired key would otherwise all
//! go to the upstream. [`KeyLocks`] hands out one async mutex per key. The
//! first caller to take it calls the upstream and [settles](KeyGuard::settle)
//! the result in the slot; callers that queued behind it find the settled
//! result when they get the lock and return it without calling again. A
//! failing upstream is therefore tried once per burst of callers, not once
//! per caller.
//!
//! A settled result lives only as long as somebody holds or waits on the
//! slot. The next caller after that starts over.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::CacheKey;

type Slot<T> = Arc<Mutex<Option<T>>>;

#[derive(Debug)]
struct KeyLocksInner<T> {
    slots: DashMap<CacheKey, Slot<T>>,
}

/// Registry of per-key async locks, each carrying the result of the last
/// holder.
///
/// Clones share the registry. Slots are dropped from the registry once
/// nobody holds or waits on them, including waiters that were cancelled.
#[derive(Debug)]
pub struct KeyLocks<T> {
    inner: Arc<KeyLocksInner<T>>,
}

impl<T> Clone for KeyLocks<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for KeyLocks<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(KeyLocksInner {
                slots: DashMap::new(),
            }),
        }
    }
}

impl<T> KeyLocks<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and takes it.
    pub async fn lock(&self, key: &CacheKey) -> KeyGuard<T> {
        // Built before waiting so a cancelled wait still cleans up the slot.
        let mut guard = KeyGuard {
            key: key.clone(),
            held: None,
            inner: Arc::clone(&self.inner),
        };
        let slot = self
            .inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        guard.held = Some(slot.lock_owned().await);
        guard
    }

    /// Number of keys with a live slot.
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    /// Returns `true` if no key is locked or awaited.
    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }
}

/// Holds the lock for one key until dropped.
#[derive(Debug)]
pub struct KeyGuard<T> {
    key: CacheKey,
    held: Option<OwnedMutexGuard<Option<T>>>,
    inner: Arc<KeyLocksInner<T>>,
}

impl<T: Clone> KeyGuard<T> {
    /// Result left by an earlier holder of this slot, if any.
    pub fn settled(&self) -> Option<T> {
        self.held.as_deref().and_then(|settled| settled.clone())
    }
}

impl<T> KeyGuard<T> {
    /// Leaves `result` for the callers queued behind this one.
    pub fn settle(&mut self, result: T) {
        if let Some(held) = self.held.as_mut() {
            **held = Some(result);
        }
    }
}

impl<T> Drop for KeyGuard<T> {
    fn drop(&mut self) {
        // Release first so the registry's Arc is the only one left when idle.
        drop(self.held.take());
        self.inner
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
