//! Stored response types.
//!
//! - [`Payload`] - An upstream response: status, headers and body
//! - [`CacheEntry`] - A payload together with the moment it was stored
//!
//! A [`CacheEntry`] carries no expiry of its own. Whether it may be served
//! is decided at read time by [`Freshness`](crate::Freshness), so the same
//! entry can be fresh for one caller and a stale fallback for another.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::mem::size_of;
use std::time::Duration;

/// An upstream HTTP response.
///
/// Headers are passed through untouched. Domain code reads application
/// headers such as total page counts through [`Payload::header_u64`].
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl Payload {
    /// Creates a payload.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Payload {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Creates a payload without headers.
    pub fn from_status(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, HeaderMap::new(), body)
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a header value parsed as an unsigned integer.
    ///
    /// ```
    /// use http::{HeaderMap, HeaderValue, StatusCode};
    /// use keepsake_core::Payload;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("X-WP-TotalPages", HeaderValue::from_static("7"));
    /// let payload = Payload::new(StatusCode::OK, headers, "[]");
    /// assert_eq!(payload.header_u64("x-wp-totalpages"), Some(7));
    /// assert_eq!(payload.header_u64("X-WP-Total"), None);
    /// ```
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.header_str(name).and_then(|v| v.trim().parse().ok())
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns `true` for 5xx responses.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Returns `true` for 4xx responses.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns the estimated memory usage of this payload in bytes.
    pub fn memory_size(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        size_of::<Self>() + headers + self.body.len()
    }
}

/// A cached payload with the time it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    payload: Payload,
    stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stored at `stored_at`.
    pub fn new(payload: Payload, stored_at: DateTime<Utc>) -> Self {
        CacheEntry { payload, stored_at }
    }

    /// Creates an entry stored now.
    pub fn now(payload: Payload) -> Self {
        Self::new(payload, Utc::now())
    }

    /// Returns the cached payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns when the entry was stored.
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Consumes the entry and returns the payload.
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Wall-clock age at `now`. An entry stored in the future has age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Returns the estimated memory usage of this entry in bytes.
    pub fn memory_size(&self) -> usize {
        size_of::<DateTime<Utc>>() + self.payload.memory_size()
    }
}
