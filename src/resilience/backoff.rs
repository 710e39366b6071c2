//! Exponential backoff between fetch attempts.

use std::time::Duration;

/// Delay after the `attempt`-th failure: `base_ms + step_ms * 2^attempt`.
///
/// `attempt` counts from 1. Large exponents saturate instead of overflowing.
pub fn calculate_backoff(attempt: u32, base_ms: u64, step_ms: u64) -> Duration {
    let exponential = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_add(step_ms.saturating_mul(exponential));

    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(1, 50, 5), Duration::from_millis(60));
        assert_eq!(calculate_backoff(2, 50, 5), Duration::from_millis(70));
        assert_eq!(calculate_backoff(9, 50, 5), Duration::from_millis(50 + 5 * 512));
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(calculate_backoff(200, 50, 5), Duration::from_millis(u64::MAX));
    }
}
