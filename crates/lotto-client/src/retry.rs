use std::time::Duration;

use tokio::time::sleep;

use crate::error::{Retry, SyncError};

/// Exponential backoff around one whole fetch attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,

    base_delay: Duration,

    /// Exponential backoff multiplier
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable
    /// error, or the attempts run out. The last error is returned.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, SyncError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut attempt = 0;
        let mut current_delay = self.base_delay;

        loop {
            attempt += 1;

            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.classify() == Retry::Retryable && attempt < self.max_attempts => {
                    log::warn!(
                        "Attempt #{attempt}/{} failed: {e}; retrying in {current_delay:?}",
                        self.max_attempts
                    );
                    sleep(current_delay).await;
                    current_delay = current_delay.mul_f64(self.backoff_multiplier);
                }
                Err(e) => {
                    log::error!("Attempt #{attempt}/{} failed: {e}", self.max_attempts);
                    return Err(e);
                }
            }
        }
    }
}
