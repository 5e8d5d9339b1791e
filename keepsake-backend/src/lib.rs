//! Cache store contract for keepsake.
//!
//! A store maps a [`CacheKey`](keepsake_core::CacheKey) to the last good
//! [`CacheEntry`](keepsake_core::CacheEntry) for it. Stores never decide
//! freshness; they keep entries until their own capacity or retention limits
//! evict them, so an expired entry stays available as a fallback.
//!
//! If you want to implement your own store, implement [`Backend`]. The
//! fetcher talks to stores through [`CacheBackend`], which adds metrics and
//! logging on top of the raw operations.
mod backend;
mod error;
pub mod metrics;

pub use backend::{Backend, BackendResult, CacheBackend};
pub use error::BackendError;
