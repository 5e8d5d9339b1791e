//! Upstream request description.
//!
//! [`FetchRequest`] is the unit the fetcher works with: a method, an absolute
//! URL, optional headers and an optional body. Headers are forwarded to the
//! upstream but never take part in the cache identity; see
//! [`CacheKey`](crate::CacheKey) for how a request becomes a key.
//!
//! ## URL normalization
//!
//! Two URLs that differ only in parameter order or fragment address the same
//! upstream resource. [`FetchRequest::normalized_url`] renders the canonical
//! form used for keying:
//!
//! - scheme and host are lowercased and default ports dropped (by parsing)
//! - the fragment is removed
//! - query pairs are sorted by name, then by value
//!
//! ```
//! use keepsake_core::FetchRequest;
//!
//! let a = FetchRequest::parse_get("https://API.example.com/posts?page=2&per_page=10#top").unwrap();
//! let b = FetchRequest::parse_get("https://api.example.com/posts?per_page=10&page=2").unwrap();
//! assert_eq!(a.normalized_url(), b.normalized_url());
//! ```

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use url::Url;

/// A request to be sent to the upstream API.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl FetchRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        FetchRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request carrying `body`.
    pub fn post(url: Url, body: impl Into<Bytes>) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    /// Parses `url` and creates a request with the given method.
    pub fn parse(method: Method, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(method, Url::parse(url)?))
    }

    /// Parses `url` and creates a `GET` request.
    pub fn parse_get(url: &str) -> Result<Self, url::ParseError> {
        Self::parse(Method::GET, url)
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type`.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    /// Adds a header forwarded to the upstream. Headers do not affect the cache key.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URL as given.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the headers forwarded to the upstream.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the upstream host, or an empty string for host-less URLs.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Returns the canonical URL used for cache keying.
    pub fn normalized_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);

        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            pairs.sort();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url.into()
    }
}
