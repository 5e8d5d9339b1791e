//! Metrics declaration and recording.
//!
//! All series carry a `host` label naming the upstream host of the request.

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of responses served from the store.
    pub static ref REQUESTED_FROM_CACHE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "keepsake_requested_from_cache_total",
            "Total number of responses served from the cache store."
        );
        "keepsake_requested_from_cache_total"
    };
    /// Track number of stale entries served because the upstream failed.
    pub static ref STALE_SERVED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "keepsake_stale_served_total",
            "Total number of stale responses served after an upstream failure."
        );
        "keepsake_stale_served_total"
    };
    /// Track number of failed upstream fetches.
    pub static ref FAILED_REQUESTS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "keepsake_failed_requests_total",
            "Total number of upstream fetches that failed after retries."
        );
        "keepsake_failed_requests_total"
    };
    /// Histogram of upstream fetch duration, retries included.
    pub static ref REQUEST_LATENCY: &'static str = {
        metrics::describe_histogram!(
            "keepsake_request_latency_seconds",
            metrics::Unit::Seconds,
            "Duration of upstream fetches in seconds, retries included."
        );
        "keepsake_request_latency_seconds"
    };
}

/// Records a response served from the store.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_from_cache(host: &str) {
    metrics::counter!(*REQUESTED_FROM_CACHE_COUNTER, "host" => host.to_owned()).increment(1);
}

/// Records a stale entry served in place of a failed upstream response.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_stale_served(host: &str) {
    metrics::counter!(*STALE_SERVED_COUNTER, "host" => host.to_owned()).increment(1);
}

/// Records a failed upstream fetch. `error` is a short error kind
/// such as `status_5xx`, `timeout` or `not_found`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_failure(host: &str, error: &'static str) {
    metrics::counter!(
        *FAILED_REQUESTS_COUNTER,
        "host" => host.to_owned(),
        "error" => error
    )
    .increment(1);
}

/// Records how long an upstream fetch took and the status it ended with.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_latency(host: &str, code: u16, duration: Duration) {
    metrics::histogram!(
        *REQUEST_LATENCY,
        "host" => host.to_owned(),
        "code" => code.to_string()
    )
    .record(duration.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_from_cache(_host: &str) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_stale_served(_host: &str) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_failure(_host: &str, _error: &'static str) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_latency(_host: &str, _code: u16, _duration: Duration) {}
