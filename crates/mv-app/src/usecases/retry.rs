//! Bounded retry for transient storage failures.

use std::future::Future;
use std::time::Duration;

use mv_core::{ConsentConfig, ConsentError};
use tracing::warn;

/// How often, and how patiently, a storage failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub attempts: u32,
    /// Delay before the second attempt; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ConsentConfig) -> Self {
        Self {
            attempts: config.storage_retry_attempts,
            backoff: config.storage_retry_backoff,
        }
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ConsentConfig::default())
    }
}

/// Runs `op` until it succeeds, fails with a terminal error, or the policy's
/// attempts are spent.
///
/// Only [`ConsentError::Storage`] is retried. Every consent operation leaves no
/// partial state behind on a storage failure, so re-running it whole is safe.
pub async fn retry_storage<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, ConsentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConsentError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < attempts => {
                let delay = policy.backoff.mul_f32(attempt as f32);
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Storage failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
