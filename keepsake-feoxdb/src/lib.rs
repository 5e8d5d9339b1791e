//! Persistent cache store for keepsake, backed by [FeOxDB](https://docs.rs/feoxdb).
//!
//! Use this store when cached responses must survive a restart, so a site
//! that comes back up while its upstream is down still has stale data to
//! fall back to.
//!
//! ```no_run
//! use keepsake_feoxdb::FeOxDbBackend;
//!
//! let backend = FeOxDbBackend::builder()
//!     .path("/var/cache/site")
//!     .build()?;
//! # Ok::<(), keepsake_feoxdb::FeOxDbError>(())
//! ```
#![warn(missing_docs)]

mod backend;
mod error;

pub use backend::{FeOxDbBackend, FeOxDbBackendBuilder};
pub use error::FeOxDbError;
