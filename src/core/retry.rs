//! Retry policies for remote provider calls.
//!
//! Two independent layers exist:
//!
//! - [`RateLimitPolicy`] wraps a single provider request and retries it only
//!   when the provider signals throttling. The wait honours a server hint of
//!   the form `try again in 4.2s` when one is present.
//! - [`ChunkRetry`] wraps a whole multi-step operation (submit + download) and
//!   retries any failure with a short linear backoff. It is meant for transient
//!   network and download failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static TRY_AGAIN_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)try again in\s+([0-9]+(?:\.[0-9]+)?)\s*s").expect("valid regex"));

/// Errors that can tell whether they were caused by provider throttling.
pub trait RateLimitSignal: Display + Sized {
    /// Whether this error is a rate-limit signal that should be retried.
    fn is_rate_limited(&self) -> bool;

    /// Convert the final rate-limit error into a non-retryable one once the
    /// retry budget has been spent.
    fn into_exhausted(self, attempts: u32) -> Self;
}

/// Rate-limit aware retry for a single provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Fallback wait per attempt number when the provider gives no hint
    pub fallback_step: Duration,
    /// Lower bound for any wait
    pub min_wait: Duration,
    /// Upper bound for any wait
    pub max_wait: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            fallback_step: Duration::from_secs(10),
            min_wait: Duration::from_secs(3),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RateLimitPolicy {
    /// Wait before retrying after `attempt` (1-based) failed with `message`.
    pub fn wait_for(&self, attempt: u32, message: &str) -> Duration {
        let suggested = parse_retry_hint(message)
            .map(|secs| Duration::from_secs(secs.ceil() as u64))
            .unwrap_or_else(|| self.fallback_step * attempt);

        suggested.clamp(self.min_wait, self.max_wait)
    }

    /// Run `op` until it succeeds, fails with a non rate-limit error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        E: RateLimitSignal,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_rate_limited() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        operation,
                        attempts = attempt,
                        error = %e,
                        "Rate limit retry budget exhausted"
                    );
                    return Err(e.into_exhausted(attempt));
                }
                Err(e) => {
                    let wait = self.wait_for(attempt, &e.to_string());
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        "Provider rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Extract the wait in seconds from a `try again in Xs` hint.
pub fn parse_retry_hint(message: &str) -> Option<f64> {
    TRY_AGAIN_HINT
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Linear-backoff retry around a whole per-chunk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRetry {
    /// Total attempts including the first one
    pub attempts: u32,
    /// Backoff unit; the wait after attempt `n` is `n * backoff`
    pub backoff: Duration,
}

impl Default for ChunkRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(750),
        }
    }
}

impl ChunkRetry {
    /// Run `op`, retrying any error. Returns the last error when every attempt
    /// failed.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!(
                        operation,
                        attempt,
                        attempts,
                        error = %e,
                        "Attempt failed"
                    );
                    if attempt >= attempts {
                        return Err(e);
                    }
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}
