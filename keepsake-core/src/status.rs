//! Cache status reported on every fetch outcome.

/// Whether a response was served fresh from the cache, fetched, or served stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Cache hit - a fresh entry was served without touching the network.
    Hit,
    /// Cache miss - the response came from the upstream.
    #[default]
    Miss,
    /// Stale data - the refresh failed and the expired entry was served instead.
    Stale,
}

impl CacheStatus {
    /// Derives the status from the served-from-cache and staleness flags.
    pub const fn from_flags(served_from_cache: bool, is_stale: bool) -> Self {
        match (served_from_cache, is_stale) {
            (true, true) => CacheStatus::Stale,
            (true, false) => CacheStatus::Hit,
            (false, _) => CacheStatus::Miss,
        }
    }

    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
