//! # Bounded Retry
//!
//! Fixed-attempt, fixed-delay retry shared by both bus publishers. There is no
//! exponential backoff, no jitter and no cancellation hook: callers that need a
//! deadline enforce it inside the attempt future.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::constants;

/// Outcome of a single failed attempt
#[derive(Debug)]
pub enum AttemptError<E> {
    /// Try again after the configured delay, if attempts remain
    Retryable(E),
    /// Stop immediately and surface this error
    Permanent(E),
}

impl<E> AttemptError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Retryable(e) | Self::Permanent(e) => e,
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::retry::MAX_ATTEMPTS,
            delay: Duration::from_millis(constants::retry::DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that always makes at least one attempt
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `attempt_fn` until it succeeds, fails permanently, or attempts run out
    ///
    /// `attempt_fn` receives the 1-based attempt number. The delay is slept
    /// after every retryable failure except the last; the last error is returned.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError<E>>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn(attempt).await {
                Ok(value) => {
                    debug!(operation = %operation, attempt, "Attempt succeeded");
                    return Ok(value);
                }
                Err(AttemptError::Permanent(e)) => {
                    warn!(operation = %operation, attempt, error = %e, "Attempt failed permanently");
                    return Err(e);
                }
                Err(AttemptError::Retryable(e)) => {
                    if attempt >= self.max_attempts {
                        warn!(
                            operation = %operation,
                            attempts = attempt,
                            error = %e,
                            "Giving up after {} attempts", attempt
                        );
                        return Err(e);
                    }
                    warn!(
                        operation = %operation,
                        attempt,
                        error = %e,
                        delay_ms = self.delay.as_millis() as u64,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
