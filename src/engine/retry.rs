//! Bounded retry with a fixed delay for remote operations.
//!
//! Only transient put.io errors (transport trouble, 5xx, rate limiting) are
//! retried. Anything else fails on the first attempt; fatal errors
//! (rejected credentials) are surfaced so the caller can abort the run.

use std::thread;
use std::time::Duration;

/// Retry bounds applied to every remote call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (≥1).
    pub max_attempts: u32,
    /// Fixed sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// A remote operation that kept failing.
#[derive(Debug)]
pub struct RetryError {
    /// The last error observed.
    pub error: putio::Error,
    /// How many attempts were made before giving up.
    pub attempts: u32,
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} attempt(s))", self.error, self.attempts)
    }
}

impl std::error::Error for RetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Run `op`, retrying transient failures up to the policy's bound.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    mut op: impl FnMut() -> putio::Result<T>,
) -> Result<T, RetryError> {
    let max = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !error.is_transient() || attempt >= max {
                    return Err(RetryError {
                        error,
                        attempts: attempt,
                    });
                }
                log::warn!(
                    "transient error (attempt {attempt}/{max}), retrying in {:?}: {error}",
                    policy.delay
                );
                thread::sleep(policy.delay);
            }
        }
    }
}
