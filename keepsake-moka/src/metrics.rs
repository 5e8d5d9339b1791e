//! Moka store metrics.
//!
//! Enable the `metrics` feature to use these metrics. All of them carry a
//! `backend` label with the store's label.
//!
//! - `keepsake_moka_entries` (gauge): responses currently held.
//! - `keepsake_moka_usage_ratio` (gauge): weighted size over configured
//!   capacity. Stores bounded by `max_entries` weigh every entry as 1, so
//!   there it is the entry count over the limit; byte-bounded stores report
//!   estimated bytes over the byte budget.
//! - `keepsake_moka_evictions_total` (counter): entries dropped by the store
//!   itself, labelled `cause` = `size` (capacity) or `retention`. Each one is
//!   a response that can no longer serve as a stale fallback. Overwrites are
//!   not counted.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "keepsake_moka_entries",
            "Responses currently held by the Moka store."
        );
        "keepsake_moka_entries"
    };

    /// Metric name for the usage gauge.
    pub static ref MOKA_USAGE_RATIO: &'static str = {
        metrics::describe_gauge!(
            "keepsake_moka_usage_ratio",
            "Weighted size of the Moka store over its configured capacity."
        );
        "keepsake_moka_usage_ratio"
    };

    /// Metric name for the eviction counter.
    pub static ref MOKA_EVICTIONS: &'static str = {
        metrics::describe_counter!(
            "keepsake_moka_evictions_total",
            "Entries dropped by the Moka store for capacity or retention."
        );
        "keepsake_moka_evictions_total"
    };
}

/// Records how full the store is after a write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_usage(backend: &str, entries: u64, ratio: f64) {
    metrics::gauge!(*MOKA_ENTRIES, "backend" => backend.to_string()).set(entries as f64);
    metrics::gauge!(*MOKA_USAGE_RATIO, "backend" => backend.to_string()).set(ratio);
}

/// Records one entry dropped by the store.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_eviction(backend: &str, cause: &'static str) {
    metrics::counter!(*MOKA_EVICTIONS, "backend" => backend.to_string(), "cause" => cause)
        .increment(1);
}

/// No-op when `metrics` feature disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_usage(_backend: &str, _entries: u64, _ratio: f64) {}

/// No-op when `metrics` feature disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_eviction(_backend: &str, _cause: &'static str) {}
