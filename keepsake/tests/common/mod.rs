#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use http::StatusCode;
use keepsake::backend::{Backend, BackendError, BackendResult};
use keepsake::{
    BackendLabel, CacheEntry, CacheKey, FetchPolicy, FetchRequest, Payload, Upstream,
    UpstreamError,
};
use keepsake_moka::MokaBackend;

/// One scripted upstream answer.
#[derive(Clone, Copy, Debug)]
pub enum Step {
    Respond(u16, &'static str),
    Refuse,
}

pub const OK: Step = Step::Respond(200, "fresh");
pub const UNAVAILABLE: Step = Step::Respond(503, "maintenance");

struct ScriptedInner {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    delay: Duration,
}

/// Upstream that plays back a script. The last step repeats forever.
/// Clones share the script and the call counter.
#[derive(Clone)]
pub struct ScriptedUpstream {
    inner: Arc<ScriptedInner>,
}

impl ScriptedUpstream {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self::delayed(steps, Duration::ZERO)
    }

    pub fn always(step: Step) -> Self {
        Self::new([step])
    }

    pub fn delayed(steps: impl IntoIterator<Item = Step>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                steps: Mutex::new(steps.into_iter().collect()),
                calls: AtomicUsize::new(0),
                delay,
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.inner.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            *steps.front().unwrap()
        }
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn call(&self, _request: &FetchRequest) -> Result<Payload, UpstreamError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if !self.inner.delay.is_zero() {
            tokio::time::sleep(self.inner.delay).await;
        }
        match self.next_step() {
            Step::Respond(status, body) => Ok(Payload::from_status(
                StatusCode::from_u16(status).unwrap(),
                body,
            )),
            Step::Refuse => Err(UpstreamError::connect("connection refused")),
        }
    }
}

/// Store whose every operation fails.
pub struct BrokenBackend;

#[async_trait]
impl Backend for BrokenBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        Err(BackendError::internal("disk on fire"))
    }

    async fn write(&self, _key: &CacheKey, _entry: CacheEntry) -> BackendResult<()> {
        Err(BackendError::internal("disk on fire"))
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("broken")
    }
}

pub fn backend() -> MokaBackend {
    MokaBackend::builder().max_entries(100).build()
}

/// Ten minute expiry, two quick retries.
pub fn policy() -> FetchPolicy {
    FetchPolicy::builder()
        .expiry(Duration::from_secs(600))
        .timeout(Duration::from_secs(2))
        .max_retries(2)
        .backoff(Duration::from_millis(1), Duration::from_millis(5))
        .build()
        .unwrap()
}

pub fn request(path: &str) -> FetchRequest {
    FetchRequest::parse_get(&format!("http://cms.test{path}")).unwrap()
}

/// An entry stored two hours ago, well past the test expiry.
pub fn stale_entry(body: &'static str) -> CacheEntry {
    CacheEntry::new(
        Payload::from_status(StatusCode::OK, body),
        Utc::now() - TimeDelta::hours(2),
    )
}
