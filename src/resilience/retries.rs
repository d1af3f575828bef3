//! Retry policy and attempt classification.
//!
//! # Design Decisions
//! - Only GET is issued, so every failed attempt is retryable
//! - Timeouts, connection errors, undecodable bodies and 5xx are failures
//! - 4xx is not a server fault; the body is decoded and returned
//! - The retry budget is per logical request: `max_retries + 1` attempts

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::UpstreamConfig;
use crate::resilience::backoff::calculate_backoff;

/// Whether a response status means the dependency itself is failing.
pub fn is_server_fault(status: StatusCode) -> bool {
    status.is_server_error()
}

/// Retry knobs for one [`ResilientClient`](crate::resilience::ResilientClient).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub attempt_timeout: Duration,
    /// Attempts allowed beyond the first.
    pub max_retries: u32,
    /// Backoff after the first failed attempt, before jitter.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Total attempts a logical fetch may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// True once `attempt` (1-based) was the last one allowed.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt > self.max_retries
    }

    /// Delay before the attempt following failed attempt `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.backoff_base)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&UpstreamConfig::default())
    }
}

impl From<&UpstreamConfig> for RetryPolicy {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            attempt_timeout: config.attempt_timeout(),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_fault_classification() {
        assert!(is_server_fault(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_server_fault(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_server_fault(StatusCode::OK));
        assert!(!is_server_fault(StatusCode::NOT_FOUND));
        assert!(!is_server_fault(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn test_policy_budget() {
        let policy = RetryPolicy {
            attempt_timeout: Duration::from_millis(500),
            max_retries: 2,
            backoff_base: Duration::from_millis(50),
        };
        assert_eq!(policy.max_attempts(), 3);
        assert!(!policy.is_exhausted(1));
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
        assert_eq!(policy.backoff(2), Duration::from_millis(120));
    }

    #[test]
    fn test_policy_from_default_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempt_timeout, Duration::from_millis(500));
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.backoff_base, Duration::from_millis(50));
    }
}
