//! Exponential backoff with jitter.
//!
//! The jitter is a fixed 20% of the exponential delay rather than a random
//! draw, so retry timing is reproducible.

use std::time::Duration;

/// Fraction of the exponential delay added on top of it.
const JITTER_DIVISOR: u32 = 5;

/// Delay to wait after attempt `attempt` (1-based) has failed.
///
/// `base * 2^(attempt - 1)` plus 20% of that value. Attempt 0 yields zero.
pub fn calculate_backoff(attempt: u32, base: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u32.saturating_pow(attempt - 1);
    let delay = base.saturating_mul(exponential_base);
    let jitter = delay / JITTER_DIVISOR;

    delay.saturating_add(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let base = Duration::from_millis(50);
        assert_eq!(calculate_backoff(1, base), Duration::from_millis(60));
        assert_eq!(calculate_backoff(2, base), Duration::from_millis(120));
        assert_eq!(calculate_backoff(3, base), Duration::from_millis(240));
    }

    #[test]
    fn test_backoff_zero_attempt_and_zero_base() {
        assert_eq!(calculate_backoff(0, Duration::from_millis(50)), Duration::ZERO);
        assert_eq!(calculate_backoff(4, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_backoff_saturates() {
        let huge = calculate_backoff(u32::MAX, Duration::from_secs(1));
        assert!(huge >= Duration::from_secs(u64::from(u32::MAX)));

        let capped = calculate_backoff(40, Duration::MAX);
        assert_eq!(capped, Duration::MAX);
    }
}
