//! Store traits for cache storage.
//!
//! This module re-exports types from `keepsake-backend` for implementing
//! custom stores:
//!
//! - `Backend` - Raw read/write trait every store implements
//! - `CacheBackend` - Read/write with metrics and logging, used by the fetcher
//! - `BackendError` - Error type for store operations
//!
//! ## Built-in Stores
//!
//! | Store | Crate | Use Case |
//! |-------|-------|----------|
//! | Moka | [`keepsake-moka`] | In-memory, bounded by entries or bytes |
//! | FeOxDB | [`keepsake-feoxdb`] | Embedded persistent storage, survives restarts |
//!
//! [`keepsake-moka`]: https://docs.rs/keepsake-moka
//! [`keepsake-feoxdb`]: https://docs.rs/keepsake-feoxdb

pub use keepsake_backend::{Backend, BackendError, BackendResult, CacheBackend};
