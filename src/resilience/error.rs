//! Error types for the resilient client.

use std::time::Duration;

use thiserror::Error;

use crate::config::ValidationError;
use crate::resilience::circuit_breaker::BreakerState;

/// Why a single attempt failed. Absorbed by the retry loop; only ever seen
/// by callers as the `last_error` of [`FetchError::RetriesExhausted`].
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream {status}")]
    UpstreamFault { status: u16 },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AttemptError::Decode(err.to_string())
        } else {
            AttemptError::Transport(err.to_string())
        }
    }
}

/// Failure to construct a client from configuration.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error(transparent)]
    InvalidUrl(#[from] ValidationError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of one logical fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Rejected by the breaker before any attempt was made.
    #[error("CircuitBreakerOpen (state={state})")]
    CircuitOpen {
        state: BreakerState,
        elapsed: Duration,
    },

    /// Every permitted attempt failed.
    #[error("all retries failed: {last_error}")]
    RetriesExhausted {
        last_error: AttemptError,
        attempts: u32,
        breaker_state: BreakerState,
        total_latency: Duration,
    },
}

impl FetchError {
    /// Attempts made against the upstream (zero when the circuit was open).
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::CircuitOpen { .. } => 0,
            FetchError::RetriesExhausted { attempts, .. } => *attempts,
        }
    }

    pub fn breaker_state(&self) -> BreakerState {
        match self {
            FetchError::CircuitOpen { state, .. } => *state,
            FetchError::RetriesExhausted { breaker_state, .. } => *breaker_state,
        }
    }

    pub fn total_latency(&self) -> Duration {
        match self {
            FetchError::CircuitOpen { elapsed, .. } => *elapsed,
            FetchError::RetriesExhausted { total_latency, .. } => *total_latency,
        }
    }
}
