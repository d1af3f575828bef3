//! Circuit breaker for the upstream dependency.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: dependency assumed down, requests fail fast
//! - Half-Open: cool-down elapsed, trial calls are admitted
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: can_call() after cool_down has elapsed since opened_at
//! Half-Open → Closed: any recorded success
//! Half-Open → Open: any recorded failure (cool-down timer restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, shared via `Arc` by every request task
//! - State, counter and `opened_at` live in one record behind one mutex
//! - Half-Open admits every caller; concurrent trial calls are possible and
//!   only the first recorded outcome decides the next transition

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::observability::metrics;

/// Externally visible state of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for the circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) that open the circuit.
    pub failure_threshold: u32,
    /// Minimum time the circuit stays open before a trial call.
    pub cool_down: Duration,
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, cool_down: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cool_down,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(5))
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    /// `None` until the first transition into Open.
    opened_at: Option<Instant>,
}

/// Consecutive-failure circuit breaker.
///
/// Every public operation takes the internal lock once, so each call sees
/// and mutates a consistent `(state, consecutive_failures, opened_at)`.
/// Nothing is held across an await point.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Admission check for one logical request.
    ///
    /// Has no side effect except the Open → Half-Open transition once the
    /// cool-down has elapsed.
    pub fn can_call(&self) -> bool {
        self.can_call_at(Instant::now())
    }

    /// Close the circuit and clear the failure streak, from any state.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        let previous = inner.state;
        inner.consecutive_failures = 0;
        inner.state = BreakerState::Closed;
        drop(inner);

        if previous != BreakerState::Closed {
            tracing::info!(from = %previous, "Circuit breaker closed");
            metrics::record_breaker_state(BreakerState::Closed);
        }
    }

    /// Count a failure and open the circuit when warranted.
    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    pub fn current_state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn can_call_at(&self, now: Instant) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map_or(true, |opened_at| now.duration_since(opened_at) >= self.config.cool_down);
                if !cooled_down {
                    return false;
                }
                inner.state = BreakerState::HalfOpen;
                drop(inner);

                tracing::info!("Circuit breaker half-open, admitting trial call");
                metrics::record_breaker_state(BreakerState::HalfOpen);
                true
            }
        }
    }

    fn record_failure_at(&self, now: Instant) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trip = match inner.state {
            BreakerState::HalfOpen => true,
            // Failures from requests admitted before the circuit opened
            // still count, and restart the cool-down.
            BreakerState::Closed | BreakerState::Open => {
                inner.consecutive_failures >= self.config.failure_threshold
            }
        };
        if !trip {
            return;
        }

        let previous = inner.state;
        let failures = inner.consecutive_failures;
        inner.state = BreakerState::Open;
        inner.opened_at = Some(now);
        drop(inner);

        if previous != BreakerState::Open {
            tracing::warn!(
                from = %previous,
                consecutive_failures = failures,
                cool_down = ?self.config.cool_down,
                "Circuit breaker opened"
            );
            metrics::record_breaker_state(BreakerState::Open);
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        // The record is always left consistent, so a poisoned lock is safe to reuse.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
