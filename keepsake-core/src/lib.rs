#![warn(missing_docs)]
//! # keepsake-core
//!
//! Core types shared by every keepsake crate.
//!
//! keepsake is a cache-aside layer that sits between an application and an
//! unreliable upstream HTTP API. It serves fresh entries from a local store,
//! refreshes expired entries on demand and falls back to the last good
//! response when the upstream is down. This crate holds the pieces every
//! other crate agrees on:
//!
//! - **Identity** of a request: [`FetchRequest`] and the deterministic [`CacheKey`]
//! - **Stored data**: [`Payload`] and [`CacheEntry`]
//! - **Freshness**: [`Freshness`] and the [`CacheState`] it produces
//! - **Network seam**: the [`Upstream`] trait and [`UpstreamError`]
//! - **Reporting**: [`CacheStatus`] and [`BackendLabel`]
//!
//! Storage lives in `keepsake-backend`, retries and the fetch algorithm live in
//! `keepsake`.

pub mod entry;
pub mod freshness;
pub mod key;
pub mod label;
pub mod request;
pub mod status;
pub mod upstream;

pub use entry::{CacheEntry, Payload};
pub use freshness::{CacheState, Freshness, is_fresh};
pub use key::{CacheKey, KeyNamespace};
pub use label::BackendLabel;
pub use request::FetchRequest;
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use status::CacheStatus;
pub use upstream::{Upstream, UpstreamError};

/// Raw byte data type used for response bodies.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
