use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use keepsake_core::{CacheStatus, Payload, Raw, UpstreamError};

/// Result of a successful fetch.
///
/// `served_from_cache` and `is_stale` say where the payload came from:
///
/// | served_from_cache | is_stale | meaning                                   |
/// |-------------------|----------|-------------------------------------------|
/// | `false`           | `false`  | fetched from the upstream and stored      |
/// | `true`            | `false`  | fresh entry, no network call              |
/// | `true`            | `true`   | upstream failed, expired entry served     |
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub(crate) payload: Payload,
    pub(crate) served_from_cache: bool,
    pub(crate) is_stale: bool,
    pub(crate) stored_at: DateTime<Utc>,
    pub(crate) served_at: DateTime<Utc>,
    pub(crate) error: Option<UpstreamError>,
}

impl FetchOutcome {
    pub(crate) fn fetched(payload: Payload, stored_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            served_from_cache: false,
            is_stale: false,
            stored_at,
            served_at: stored_at,
            error: None,
        }
    }

    pub(crate) fn hit(payload: Payload, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            payload,
            served_from_cache: true,
            is_stale: false,
            stored_at,
            served_at: now,
            error: None,
        }
    }

    pub(crate) fn stale(
        payload: Payload,
        stored_at: DateTime<Utc>,
        now: DateTime<Utc>,
        error: UpstreamError,
    ) -> Self {
        Self {
            payload,
            served_from_cache: true,
            is_stale: true,
            stored_at,
            served_at: now,
            error: Some(error),
        }
    }

    /// The same payload, as seen by a caller that waited for it.
    pub(crate) fn shared(self, now: DateTime<Utc>) -> Self {
        Self {
            served_from_cache: true,
            served_at: now,
            ..self
        }
    }

    /// The response.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.payload.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.payload.headers
    }

    /// Response body.
    pub fn body(&self) -> &Raw {
        &self.payload.body
    }

    /// `true` if the payload came from the store.
    pub fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }

    /// `true` if the payload is an expired entry served after an upstream failure.
    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    /// Hit, miss or stale.
    pub fn cache_status(&self) -> CacheStatus {
        CacheStatus::from_flags(self.served_from_cache, self.is_stale)
    }

    /// When the payload was stored.
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Age of the payload when it was served.
    pub fn age(&self) -> Duration {
        (self.served_at - self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// The upstream failure hidden behind a stale payload.
    pub fn error(&self) -> Option<&UpstreamError> {
        self.error.as_ref()
    }

    /// Consumes the outcome, returning the response.
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}
