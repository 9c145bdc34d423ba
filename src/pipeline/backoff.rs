//! Capped exponential backoff between retries of a page request

use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Retry settings for a single page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct ExponentialBackoff {
    policy: RetryPolicy,
    current_attempt: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BackoffStop {
    MaxRetriesExceeded,
    Cancelled,
}

impl std::fmt::Display for BackoffStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackoffStop::MaxRetriesExceeded => write!(f, "Maximum retry attempts exceeded"),
            BackoffStop::Cancelled => write!(f, "Retry cancelled"),
        }
    }
}

impl std::error::Error for BackoffStop {}

impl ExponentialBackoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            current_attempt: 0,
        }
    }

    /// Delay before the next attempt, capped at `max_delay`
    pub fn next_delay(&self) -> Duration {
        let factor = 2u32.saturating_pow(self.current_attempt);
        self.policy
            .initial_delay
            .saturating_mul(factor)
            .min(self.policy.max_delay)
    }

    /// Wait for the next attempt, or stop when retries are exhausted or the
    /// token fires
    pub async fn sleep(&mut self, cancel: &CancellationToken) -> Result<(), BackoffStop> {
        if self.current_attempt >= self.policy.max_retries {
            return Err(BackoffStop::MaxRetriesExceeded);
        }

        let delay = self.next_delay();
        log::warn!(
            "⏳ Retry attempt {} of {} in {}ms",
            self.current_attempt + 1,
            self.policy.max_retries,
            delay.as_millis()
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BackoffStop::Cancelled),
            _ = sleep(delay) => {}
        }

        self.current_attempt += 1;
        Ok(())
    }

    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }
}
