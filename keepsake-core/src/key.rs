//! Cache key types and construction.
//!
//! - [`CacheKey`] - The complete cache key with prefix, version, and digest
//! - [`KeyNamespace`] - Prefix and version shared by every key of a deployment
//!
//! ## Key Structure
//!
//! Cache keys have three components:
//!
//! 1. **Prefix** - Optional namespace for grouping related keys
//! 2. **Version** - Numeric version for cache invalidation
//! 3. **Digest** - SHA-256 of the request identity (method, normalized URL, body)
//!
//! ## Format
//!
//! When rendered to string, keys follow this format:
//! `{prefix}:v{version}:{digest}`
//!
//! - Prefix is omitted if empty
//! - Version is omitted if zero
//!
//! ```
//! use keepsake_core::{CacheKey, FetchRequest, KeyNamespace};
//!
//! let request = FetchRequest::parse_get("https://example.com/posts?page=1").unwrap();
//! let key = KeyNamespace::new("cms", 2).key_for(&request);
//! assert!(key.to_string().starts_with("cms:v2:"));
//!
//! let bare = CacheKey::new("", 0, "abc");
//! assert_eq!(bare.to_string(), "abc");
//! ```
//!
//! Bumping the version makes every previously written entry unreachable,
//! which is how a deployment invalidates its whole cache.
//!
//! [`CacheKey`] uses `Arc` internally for cheap cloning.

use sha2::{Digest, Sha256};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::request::FetchRequest;

#[derive(Debug, Eq, PartialEq, Hash)]
struct CacheKeyInner {
    prefix: SmolStr,
    version: u32,
    digest: SmolStr,
}

/// A cache key identifying a cached entry.
///
/// Two logically identical requests always produce equal keys: the digest
/// covers the method, the [normalized URL](FetchRequest::normalized_url) and
/// the body, and nothing else. Headers never take part.
///
/// # Example
///
/// ```
/// use keepsake_core::{CacheKey, FetchRequest};
///
/// let a = FetchRequest::parse_get("https://example.com/posts?a=1&b=2").unwrap();
/// let b = FetchRequest::parse_get("https://example.com/posts?b=2&a=1").unwrap();
/// assert_eq!(CacheKey::from_request(&a), CacheKey::from_request(&b));
/// ```
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.inner.prefix.is_empty() {
            write!(f, "{}:", self.inner.prefix)?;
        }
        if self.inner.version > 0 {
            write!(f, "v{}:", self.inner.version)?;
        }
        f.write_str(&self.inner.digest)
    }
}

impl CacheKey {
    /// Creates a new cache key from its components.
    pub fn new(prefix: impl Into<SmolStr>, version: u32, digest: impl Into<SmolStr>) -> Self {
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                prefix: prefix.into(),
                version,
                digest: digest.into(),
            }),
        }
    }

    /// Derives the key of `request` with an empty prefix and version 0.
    pub fn from_request(request: &FetchRequest) -> Self {
        KeyNamespace::default().key_for(request)
    }

    /// Returns the cache key prefix.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Returns the cache key version number.
    pub fn version(&self) -> u32 {
        self.inner.version
    }

    /// Returns the hex-encoded request digest.
    pub fn digest(&self) -> &str {
        &self.inner.digest
    }

    /// Returns the estimated memory usage of this cache key in bytes.
    pub fn memory_size(&self) -> usize {
        use std::mem::size_of;

        // Arc heap allocation: strong count + weak count + data
        let arc_overhead = 2 * size_of::<usize>() + size_of::<CacheKeyInner>();
        // SmolStr keeps up to 23 bytes inline; the 64-char digest lives on the heap.
        let heap = |len: usize| len.saturating_sub(23);

        arc_overhead + heap(self.inner.prefix.len()) + heap(self.inner.digest.len())
    }
}

/// Prefix and version applied to every key a fetcher produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyNamespace {
    prefix: SmolStr,
    version: u32,
}

impl KeyNamespace {
    /// Creates a namespace.
    pub fn new(prefix: impl Into<SmolStr>, version: u32) -> Self {
        KeyNamespace {
            prefix: prefix.into(),
            version,
        }
    }

    /// Returns the namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the namespace version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Derives the cache key of `request` inside this namespace.
    pub fn key_for(&self, request: &FetchRequest) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(request.method().as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(request.normalized_url().as_bytes());
        hasher.update(b"\n");
        if let Some(body) = request.body() {
            hasher.update(body);
        }
        let digest = hex::encode(hasher.finalize());

        CacheKey::new(self.prefix.clone(), self.version, digest)
    }
}
