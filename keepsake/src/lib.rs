#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Store re-exports.
///
/// Provides the [`Backend`](keepsake_backend::Backend) trait for implementing
/// custom stores.
pub mod backend;

pub mod concurrency;

/// Error types for fetch operations.
///
/// Defines [`FetchError`] which covers:
/// - Not found (4xx with nothing stored)
/// - Hard failures (upstream down with nothing stored)
/// - Invalid URLs
pub mod error;

mod fetcher;

/// Metrics collection for fetch observability.
///
/// When the `metrics` feature is enabled, this module provides counters
/// and histograms for:
/// - Responses served from the store, stale ones included
/// - Failed upstream fetches by error kind
/// - Upstream latency by status code
pub mod metrics;

mod outcome;

/// Fetch policy configuration.
///
/// Defines [`FetchPolicy`](policy::FetchPolicy) with:
/// - **Expiry**: how long stored responses are served without a network call
/// - **Timeout**: bound on every upstream attempt
/// - **Retry**: attempts, backoff and transient statuses
pub mod policy;

pub mod retry;

pub mod url;

pub use error::{FetchError, PolicyError};
pub use fetcher::Fetcher;
pub use outcome::FetchOutcome;
pub use policy::{FetchPolicy, RetryPolicy};
pub use retry::{Backoff, RetryUpstream};

pub use keepsake_core::{
    BackendLabel, CacheEntry, CacheKey, CacheState, CacheStatus, FetchRequest, Freshness,
    KeyNamespace, Payload, Raw, Upstream, UpstreamError,
};
