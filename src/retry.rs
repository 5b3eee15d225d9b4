//! Retry configuration and the shared backoff loop.
//!
//! [`with_backoff`] wraps a fallible async operation with exponential
//! backoff on transient status codes, as classified by
//! [`HermodError::is_retryable()`]. Non-retryable failures are returned
//! immediately; an exhausted retry budget yields a synthetic
//! [`HermodError::RetriesExhausted`] instead of the original cause.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::telemetry;
use crate::{HermodError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff. Immutable once handed to [`with_backoff`]:
///
/// ```rust
/// # use hermod::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    /// 0 = single attempt. Default: 3.
    pub max_retries: u32,
    /// Delay before the first retry. Default: 2s.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
    /// Growth factor applied to the delay after each retry. Default: 2.0.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retries after the initial attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff growth factor.
    pub fn multiplier(mut self, factor: f64) -> Self {
        self.multiplier = factor;
        self
    }

    /// Delay before retry number `attempt` (0-indexed): `initial_delay *
    /// multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay.mul_f64(self.multiplier.powi(attempt as i32));
        delay.min(self.max_delay)
    }
}

/// Execute an async operation with retry on transient failures.
///
/// The operation runs once, then up to `config.max_retries` more times.
/// On success the result is returned immediately; a non-retryable error
/// is returned immediately; a retryable error sleeps the backoff delay
/// and tries again. Once the budget is spent the loop returns
/// [`HermodError::RetriesExhausted`], not the last cause.
pub async fn with_backoff<F, Fut, T>(operation: &str, config: &RetryConfig, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt - 1);
            metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation.to_owned())
                .increment(1);
            info!(
                operation,
                attempt,
                max_retries = config.max_retries,
                delay_ms = delay.as_millis() as u64,
                "retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation, attempts = attempt + 1, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() => {
                warn!(operation, attempt = attempt + 1, error = %err, "transient failure");
            }
            Err(err) => return Err(err),
        }
    }
    Err(HermodError::RetriesExhausted {
        operation: operation.to_string(),
        attempts: config.max_retries + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_exponentially_and_cap() {
        let config = RetryConfig::new()
            .max_retries(3)
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(1000));

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        // Growth is capped, never exceeds max_delay
        assert_eq!(config.delay_for_attempt(5), Duration::from_millis(1000));
    }

    #[test]
    fn default_config_values() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay, Duration::from_secs(2));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.multiplier, 2.0);
    }
}
