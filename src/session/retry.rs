//! Caller-side retry for transient backend failures
//!
//! Neither the verifier nor the permission store retries on its own. Callers
//! that want to can wrap an operation with [`retry_unavailable`], which backs
//! off exponentially on `Unavailable` and returns every other error at once.

use crate::error::GateResult;
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retrying transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (will be exponentially backed off)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        let delay_ms = std::cmp::min(
            self.initial_delay_ms.saturating_mul(factor),
            self.max_delay_ms,
        );
        Duration::from_millis(delay_ms)
    }
}

/// Runs `operation`, retrying only while it fails with `Unavailable`.
pub async fn retry_unavailable<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> GateResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GateResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} (retry {}/{} in {}ms)",
                    e,
                    attempt,
                    policy.max_retries,
                    delay.as_millis()
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
