use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Backoff between consecutive download attempts for one locale
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles the delay each time)
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    /// Policy for bundle downloads: `download_retry` attempts starting at
    /// `retry_delay`.
    pub fn bundle_download(config: &crate::config::Config) -> Self {
        Self::new(config.download_retry, config.retry_delay)
    }

    /// Delay to wait before the given attempt (0-indexed). The first attempt
    /// never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Sleep for the backoff that precedes `attempt`.
    pub async fn wait_before(&self, attempt: u32, operation_name: &str) {
        let delay = self.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: Retry attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                self.max_attempts,
                delay
            );
            sleep(delay).await;
        }
    }
}
