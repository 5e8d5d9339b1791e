#![allow(dead_code)]

mod test_backend;

pub use test_backend::{BrokenBackend, TestBackend};

use http::StatusCode;
use keepsake_core::{CacheEntry, CacheKey, Payload};

pub fn key(name: &str) -> CacheKey {
    CacheKey::new("test", 1, name)
}

pub fn entry(body: &'static str) -> CacheEntry {
    CacheEntry::now(Payload::from_status(StatusCode::OK, body))
}
