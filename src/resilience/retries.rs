//! Retry policy for secret fetches.
//!
//! # Responsibilities
//! - Bound the number of attempts per fetch
//! - Produce the delay before the next attempt
//!
//! # Design Decisions
//! - Permanent failures (rejected credentials) are never retried; the caller
//!   classifies errors, the policy only counts
//! - No jitter: a single process polls one backend, so there is no herd

use std::time::Duration;

use crate::resilience::backoff::calculate_backoff;

/// Attempts per fetch before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Fixed part of every backoff delay.
pub const DEFAULT_BASE_DELAY_MS: u64 = 50;

/// Multiplier of the exponential part of the delay.
pub const DEFAULT_STEP_MS: u64 = 5;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub step_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            step_ms: DEFAULT_STEP_MS,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt may follow `failed_attempts` failures.
    pub fn should_retry(&self, failed_attempts: u32) -> bool {
        failed_attempts < self.max_attempts
    }

    /// Delay to wait after the `failed_attempts`-th failure.
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        calculate_backoff(failed_attempts, self.base_delay_ms, self.step_ms)
    }
}
