//! Retry transport.
//!
//! [`RetryUpstream`] wraps any [`Upstream`] with a per-attempt timeout and
//! bounded retries on transient statuses and network failures.

use std::time::Duration;

use async_trait::async_trait;
use keepsake_core::{FetchRequest, Payload, Upstream, UpstreamError};
use tracing::warn;

use crate::policy::FetchPolicy;

/// Exponential backoff curve: `base * 2^attempt`, capped at `max`.
///
/// ```
/// use std::time::Duration;
/// use keepsake::retry::Backoff;
///
/// let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(1));
/// assert_eq!(backoff.delay(0), Duration::from_millis(100));
/// assert_eq!(backoff.delay(2), Duration::from_millis(400));
/// assert_eq!(backoff.delay(10), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    /// Creates a curve starting at `base` and never exceeding `max`.
    pub const fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Wait before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// An [`Upstream`] that retries its inner upstream.
///
/// Every attempt is bounded by the policy timeout. A response with a
/// transient status or any transport error is retried after a backoff, up
/// to `max_retries` times. When retries run out, a transient response is
/// turned into [`UpstreamError::Status`] and a transport error is returned
/// as is. Any other response is returned on the spot, 4xx included.
#[derive(Debug, Clone)]
pub struct RetryUpstream<U> {
    upstream: U,
    policy: FetchPolicy,
}

impl<U> RetryUpstream<U> {
    /// Wraps `upstream`.
    pub fn new(upstream: U, policy: FetchPolicy) -> Self {
        Self { upstream, policy }
    }

    /// The wrapped upstream.
    pub fn inner(&self) -> &U {
        &self.upstream
    }

    /// The policy in effect.
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }
}

impl<U: Upstream> RetryUpstream<U> {
    async fn attempt(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        match tokio::time::timeout(self.policy.timeout, self.upstream.call(request)).await {
            Ok(result) => result,
            Err(elapsed) => Err(UpstreamError::timeout(elapsed)),
        }
    }

    /// Sends `request`, retrying as configured.
    pub async fn send(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        let retry = &self.policy.retry;
        let backoff = retry.backoff();
        let mut attempt = 0;
        loop {
            let result = self.attempt(request).await;
            let transient = match &result {
                Ok(payload) => retry.is_transient(payload.status),
                Err(_) => true,
            };
            if !transient {
                return result;
            }
            if attempt >= retry.max_retries {
                return result.and_then(|payload| Err(UpstreamError::Status(payload)));
            }

            let delay = backoff.delay(attempt);
            attempt += 1;
            match &result {
                Ok(payload) => warn!(
                    url = %request.url(),
                    attempt,
                    status = payload.status.as_u16(),
                    backoff_ms = delay.as_millis() as u64,
                    "transient upstream status, retrying"
                ),
                Err(error) => warn!(
                    url = %request.url(),
                    attempt,
                    error = %error,
                    backoff_ms = delay.as_millis() as u64,
                    "upstream request failed, retrying"
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<U: Upstream> Upstream for RetryUpstream<U> {
    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        self.send(request).await
    }
}
