//! Retry mechanism for ledger operations.

use crate::{metrics::RetryMetrics, CanRetry};
use std::{fmt::Debug, future::Future, time::Duration};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts. None means infinite retries.
    pub max_retries: Option<usize>,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Whether to use exponential backoff.
    pub exponential_backoff: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: Some(10), initial_delay_ms: 20, exponential_backoff: true }
    }
}

impl RetryConfig {
    /// Returns a new [`RetryConfig`].
    pub const fn new(max_retries: usize, initial_delay_ms: u64, exponential_backoff: bool) -> Self {
        Self { max_retries: Some(max_retries), initial_delay_ms, exponential_backoff }
    }

    fn delay(&self, attempt: usize) -> Duration {
        let delay_ms = if self.exponential_backoff {
            self.initial_delay_ms.saturating_mul(2u64.saturating_pow(attempt as u32))
        } else {
            self.initial_delay_ms
        };
        Duration::from_millis(delay_ms)
    }
}

/// Runs the operation until it succeeds, fails with an error that can't be retried, or the retries
/// are exhausted. Each attempt must start from a fresh read of the state it mutates.
pub async fn retry_operation_with_name<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: CanRetry + Debug,
{
    let metrics = RetryMetrics::default();
    let mut attempt: usize = 0;

    loop {
        match operation().await {
            Ok(result) => {
                metrics.attempts_before_success.record(attempt as f64);
                return Ok(result)
            }
            Err(error) => {
                if !error.can_retry() {
                    return Err(error)
                }
                if config.max_retries.is_some_and(|max| attempt >= max) {
                    return Err(error)
                }

                let delay = config.delay(attempt);
                attempt += 1;
                tracing::debug!(target: "zkevm::db", operation = operation_name, ?error, attempt, ?delay, "Retrying ledger operation");

                tokio::time::sleep(delay).await;
            }
        }
    }
}
