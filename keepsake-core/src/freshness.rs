//! Freshness policy.
//!
//! An entry is **fresh** while its age does not exceed the configured expiry,
//! and **stale** afterwards. A key with no entry at all is **absent**, which
//! is a different state: a stale entry can still be served as a fallback,
//! an absent one cannot.
//!
//! ```
//! use chrono::{TimeDelta, Utc};
//! use http::StatusCode;
//! use keepsake_core::{CacheEntry, CacheState, Freshness, Payload};
//! use std::time::Duration;
//!
//! let now = Utc::now();
//! let policy = Freshness::new(Duration::from_secs(600));
//! let entry = CacheEntry::new(Payload::from_status(StatusCode::OK, "{}"), now - TimeDelta::minutes(11));
//!
//! assert!(matches!(policy.state(Some(entry), now), CacheState::Stale(_)));
//! assert!(matches!(policy.state(None, now), CacheState::Absent));
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::entry::CacheEntry;

/// Returns `true` iff `now - entry.stored_at <= expiry`.
pub fn is_fresh(entry: &CacheEntry, now: DateTime<Utc>, expiry: Duration) -> bool {
    entry.age(now) <= expiry
}

/// State of a cache lookup after applying the freshness policy.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheState<T> {
    /// The entry is within its expiry window.
    Fresh(T),
    /// The entry has outlived its expiry window but is still available.
    Stale(T),
    /// Nothing is stored under the key.
    Absent,
}

impl<T> CacheState<T> {
    /// Returns the held entry, if any.
    pub fn into_inner(self) -> Option<T> {
        match self {
            CacheState::Fresh(value) | CacheState::Stale(value) => Some(value),
            CacheState::Absent => None,
        }
    }
}

/// Expiry window applied to cached entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    expiry: Duration,
}

impl Freshness {
    /// Creates a policy with the given expiry window.
    pub const fn new(expiry: Duration) -> Self {
        Freshness { expiry }
    }

    /// Returns the expiry window.
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Returns `true` if `entry` is still fresh at `now`.
    pub fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        is_fresh(entry, now, self.expiry)
    }

    /// Classifies a lookup result.
    pub fn state(&self, entry: Option<CacheEntry>, now: DateTime<Utc>) -> CacheState<CacheEntry> {
        match entry {
            Some(entry) if self.is_fresh(&entry, now) => CacheState::Fresh(entry),
            Some(entry) => CacheState::Stale(entry),
            None => CacheState::Absent,
        }
    }
}
