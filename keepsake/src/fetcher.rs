use std::time::Instant;

use chrono::Utc;
use keepsake_backend::{Backend, CacheBackend};
use keepsake_core::{
    CacheEntry, CacheKey, CacheState, FetchRequest, Freshness, KeyNamespace, Payload, Upstream,
    UpstreamError,
};
use tracing::{Instrument, debug, info_span, warn};

use crate::concurrency::KeyLocks;
use crate::error::{FetchError, PolicyError};
use crate::metrics;
use crate::outcome::FetchOutcome;
use crate::policy::FetchPolicy;
use crate::retry::RetryUpstream;

/// Cache-aside fetcher with stale-on-error fallback.
///
/// For every request the fetcher derives a [`CacheKey`] and looks it up in
/// the store:
///
/// - **fresh** entries are returned without touching the network;
/// - **absent** entries are fetched through the retry transport. A 4xx becomes
///   [`FetchError::NotFound`], a failure becomes [`FetchError::HardFailure`];
/// - **stale** entries are refreshed. If the refresh fails or answers 5xx,
///   the stale entry is returned with [`FetchOutcome::is_stale`] set and the
///   failure attached, instead of an error.
///
/// Upstream calls for one key are coalesced: callers that arrive while a
/// refresh or first fetch is in flight wait for it and share its result,
/// the stale fallback or the error included, instead of calling again.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// # use keepsake_core::{FetchRequest, Payload, Upstream, UpstreamError};
/// # struct Api;
/// # #[async_trait::async_trait]
/// # impl Upstream for Api {
/// #     async fn call(&self, _: &FetchRequest) -> Result<Payload, UpstreamError> { unimplemented!() }
/// # }
/// # let backend = keepsake_moka::MokaBackend::builder().max_entries(1000).build();
/// use keepsake::{Fetcher, FetchPolicy};
///
/// let fetcher = Fetcher::new(backend, Api, FetchPolicy::default())?;
/// let outcome = fetcher.get("https://cms.example.com/wp-json/wp/v2/posts").await?;
/// println!("{} ({})", outcome.status(), outcome.cache_status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher<B, U> {
    backend: B,
    transport: RetryUpstream<U>,
    freshness: Freshness,
    namespace: KeyNamespace,
    locks: KeyLocks<Result<FetchOutcome, FetchError>>,
}

impl<B, U> Fetcher<B, U>
where
    B: Backend,
    U: Upstream,
{
    /// Creates a fetcher over `backend` and `upstream`.
    pub fn new(backend: B, upstream: U, policy: FetchPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            backend,
            freshness: Freshness::new(policy.expiry),
            transport: RetryUpstream::new(upstream, policy),
            namespace: KeyNamespace::default(),
            locks: KeyLocks::new(),
        })
    }

    /// Sets the key namespace. Changing the version orphans every stored entry.
    pub fn namespace(mut self, namespace: KeyNamespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// The store.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The policy in effect.
    pub fn policy(&self) -> &FetchPolicy {
        self.transport.policy()
    }

    /// Key under which `request` is stored.
    pub fn key_for(&self, request: &FetchRequest) -> CacheKey {
        self.namespace.key_for(request)
    }

    /// Fetches a GET request for `url`.
    pub async fn get(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        let request = FetchRequest::parse_get(url)?;
        self.fetch(&request).await
    }

    /// Fetches `request`, serving from the store whenever possible.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let key = self.key_for(request);
        let span = info_span!(
            "keepsake.fetch",
            method = %request.method(),
            host = request.host(),
            key = %key,
        );
        self.fetch_keyed(request, key).instrument(span).await
    }

    async fn fetch_keyed(
        &self,
        request: &FetchRequest,
        key: CacheKey,
    ) -> Result<FetchOutcome, FetchError> {
        if let CacheState::Fresh(entry) = self.lookup(&key).await {
            return Ok(self.hit(request, entry));
        }

        let mut guard = self.locks.lock(&key).await;
        if let Some(settled) = guard.settled() {
            return Ok(self.shared(request, settled?));
        }

        let result = match self.lookup(&key).await {
            CacheState::Fresh(entry) => return Ok(self.hit(request, entry)),
            CacheState::Stale(entry) => Ok(self.refresh(request, &key, entry).await),
            CacheState::Absent => self.first_fetch(request, &key).await,
        };
        guard.settle(result.clone());
        result
    }

    /// Outcome for a caller that waited on another caller's upstream call.
    fn shared(&self, request: &FetchRequest, outcome: FetchOutcome) -> FetchOutcome {
        debug!(
            url = %request.url(),
            stale = outcome.is_stale(),
            "served result of a concurrent fetch"
        );
        let host = request.host();
        metrics::record_from_cache(host);
        if outcome.is_stale() {
            metrics::record_stale_served(host);
        }
        outcome.shared(Utc::now())
    }

    async fn lookup(&self, key: &CacheKey) -> CacheState<CacheEntry> {
        // Read failures are logged by the store and count as absence.
        let entry = self.backend.get(key).await.unwrap_or_default();
        self.freshness.state(entry, Utc::now())
    }

    fn hit(&self, request: &FetchRequest, entry: CacheEntry) -> FetchOutcome {
        let now = Utc::now();
        debug!(
            url = %request.url(),
            age_ms = entry.age(now).as_millis() as u64,
            "cache hit"
        );
        metrics::record_from_cache(request.host());
        let stored_at = entry.stored_at();
        FetchOutcome::hit(entry.into_payload(), stored_at, now)
    }

    async fn first_fetch(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
    ) -> Result<FetchOutcome, FetchError> {
        debug!(url = %request.url(), "cache miss");
        let host = request.host();
        let url = request.url().to_string();

        match self.call(request).await {
            Ok(payload) if payload.is_client_error() => {
                metrics::record_failure(host, "not_found");
                Err(FetchError::NotFound {
                    url,
                    response: payload,
                })
            }
            Ok(payload) if payload.status.as_u16() >= 400 => {
                let source = UpstreamError::Status(payload);
                metrics::record_failure(host, source.kind());
                Err(FetchError::HardFailure { url, source })
            }
            Ok(payload) => Ok(self.store(key, payload).await),
            Err(source) => {
                metrics::record_failure(host, source.kind());
                Err(FetchError::HardFailure { url, source })
            }
        }
    }

    async fn refresh(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        stale: CacheEntry,
    ) -> FetchOutcome {
        let now = Utc::now();
        debug!(
            url = %request.url(),
            age_ms = stale.age(now).as_millis() as u64,
            "cache entry is stale, refreshing"
        );

        let error = match self.call(request).await {
            Ok(payload) if !payload.is_server_error() => return self.store(key, payload).await,
            Ok(payload) => UpstreamError::Status(payload),
            Err(error) => error,
        };

        let host = request.host();
        warn!(url = %request.url(), %error, "upstream failed, serving stale entry");
        metrics::record_failure(host, error.kind());
        metrics::record_from_cache(host);
        metrics::record_stale_served(host);

        let stored_at = stale.stored_at();
        FetchOutcome::stale(stale.into_payload(), stored_at, Utc::now(), error)
    }

    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        let started = Instant::now();
        let result = self.transport.send(request).await;
        let status = match &result {
            Ok(payload) => Some(payload.status),
            Err(error) => error.payload().map(|payload| payload.status),
        };
        if let Some(status) = status {
            metrics::record_latency(request.host(), status.as_u16(), started.elapsed());
        }
        result
    }

    async fn store(&self, key: &CacheKey, payload: Payload) -> FetchOutcome {
        let entry = CacheEntry::now(payload.clone());
        let stored_at = entry.stored_at();
        // Write failures are logged by the store and never fail the fetch.
        let _ = self.backend.set(key, entry).await;
        FetchOutcome::fetched(payload, stored_at)
    }
}
