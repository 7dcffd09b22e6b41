/*!
 * Store Retry
 * Bounded retry with exponential backoff for transient store failures
 */

use super::traits::StoreResult;
use crate::core::SimulationConfig;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently to retry a store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// Single attempt, no waiting
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.store_retry_attempts.max(1), config.store_retry_backoff())
    }

    /// Backoff before the given retry (1-based); doubles per attempt
    #[inline]
    fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// `on_retry` runs once per retried failure (used for statistics).
    pub async fn run<T, F, Fut, R>(&self, op: &str, mut operation: F, mut on_retry: R) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
        R: FnMut(),
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.delay(attempt);
                    warn!(
                        op,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Store operation failed, retrying"
                    );
                    on_retry();
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}
