use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::retry::Backoff;

/// Retry behavior of the transport.
///
/// A request is attempted once and then retried up to `max_retries` times
/// while the upstream answers with one of `transient_statuses` or fails at
/// the network level. The wait before retry `n` (0-based) is
/// `backoff_base * 2^n`, capped at `backoff_max`.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry (e.g. "100ms").
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,
    /// Upper bound of any single wait.
    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,
    /// Statuses worth retrying.
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(10),
            transient_statuses: vec![500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Returns a policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Returns `true` if `status` should be retried.
    pub fn is_transient(&self, status: StatusCode) -> bool {
        self.transient_statuses.contains(&status.as_u16())
    }

    /// The backoff curve described by this policy.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_base, self.backoff_max)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        match self
            .transient_statuses
            .iter()
            .find(|status| !(100..=599).contains(*status))
        {
            Some(status) => Err(PolicyError::InvalidStatus(*status)),
            None => Ok(()),
        }
    }
}

/// Freshness, timeout and retry settings of a fetcher.
///
/// ```
/// use std::time::Duration;
/// use keepsake::policy::FetchPolicy;
///
/// let policy = FetchPolicy::builder()
///     .expiry(Duration::from_secs(600))
///     .timeout(Duration::from_secs(3))
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(policy.retry.transient_statuses, vec![500, 502, 503, 504]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct FetchPolicy {
    /// How long a stored response is served without contacting the upstream.
    #[serde(with = "humantime_serde")]
    pub expiry: Duration,
    /// Bound on every single upstream attempt. Must not be zero.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Retry behavior.
    pub retry: RetryPolicy,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            expiry: Duration::from_secs(3600),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchPolicy {
    /// Starts a builder from the defaults.
    pub fn builder() -> FetchPolicyBuilder {
        FetchPolicyBuilder::default()
    }

    /// Checks the policy for values a fetcher cannot work with.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        self.retry.validate()
    }
}

/// Builder for [`FetchPolicy`].
#[derive(Debug, Default)]
pub struct FetchPolicyBuilder {
    policy: FetchPolicy,
}

impl FetchPolicyBuilder {
    /// Sets the expiry window.
    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.policy.expiry = expiry;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.policy.retry = retry;
        self
    }

    /// Sets the number of retries after the first attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.retry.max_retries = max_retries;
        self
    }

    /// Sets the first wait and the cap of the backoff curve.
    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.policy.retry.backoff_base = base;
        self.policy.retry.backoff_max = max;
        self
    }

    /// Sets the statuses worth retrying.
    pub fn transient_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.policy.retry.transient_statuses = statuses.into_iter().collect();
        self
    }

    /// Validates and returns the policy.
    pub fn build(self) -> Result<FetchPolicy, PolicyError> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}
