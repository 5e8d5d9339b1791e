//! In-memory cache store for keepsake, powered by [Moka](https://docs.rs/moka).
//!
//! ```
//! use keepsake_moka::MokaBackend;
//!
//! let backend = MokaBackend::builder().max_entries(10_000).build();
//! ```
//!
//! Entries are bounded by count or by approximate byte size and are never
//! expired by freshness: an entry outlives its expiry window so it can be
//! served as a stale fallback. An optional [retention](MokaBackendBuilder::retention)
//! caps how long any entry is kept at all.
//!
//! Data is lost on process restart; use `keepsake-feoxdb` for persistence.
#![warn(missing_docs)]

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaBackend;
pub use builder::{ByteCapacity, EntryCapacity, MokaBackendBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
