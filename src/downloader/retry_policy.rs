//! Per-provider retry policy.
//!
//! Each provider kind carries its own policy: the primary extraction hosts
//! re-sign and retry with a fixed pause, public endpoints get one shot.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::ProviderError;
use crate::config::ProviderSettings;

/// Bounded retry policy with a fixed pause between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause before every attempt after the first.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Policy for the primary tier's re-signing loop.
    pub fn primary(settings: &ProviderSettings) -> Self {
        Self {
            max_attempts: settings.refetch_attempts.max(1),
            backoff: Duration::from_millis(settings.refetch_backoff_ms),
        }
    }

    /// Single attempt, no pause.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Pause to observe before attempt number `attempt` (1-based).
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.backoff
        }
    }

    /// Check if another attempt is allowed after `attempts_made`.
    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. Every attempt starts from scratch.
    pub async fn run<T, F, Fut>(&self, provider: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let backoff = self.backoff_before(attempt);
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && self.has_attempts_left(attempt) => {
                    warn!(
                        "{}: attempt {}/{} failed: {}",
                        provider, attempt, self.max_attempts, e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}
