//! Resilient upstream client.
//!
//! Wraps every logical fetch with the circuit breaker gate, a per-attempt
//! timeout, and bounded retries with backoff. Callers only ever see a
//! [`FetchResult`] or one of the two [`FetchError`] classifications.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::config::validation::parse_http_url;
use crate::config::FrontendConfig;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig};
use crate::resilience::error::{ClientBuildError, FetchError};
use crate::resilience::retries::RetryPolicy;
use crate::resilience::timeouts::with_timeout;
use crate::resilience::upstream::{HttpUpstream, Upstream};

/// Successful outcome of [`ResilientClient::fetch`].
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub payload: Value,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// Breaker state observed once the fetch completed.
    pub breaker_state: BreakerState,
    pub total_latency: Duration,
    /// Latency of the attempt that succeeded.
    pub attempt_latency: Duration,
}

/// Client for one upstream dependency, guarded by its circuit breaker.
#[derive(Debug)]
pub struct ResilientClient<U = HttpUpstream> {
    upstream: U,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
}

impl ResilientClient<HttpUpstream> {
    /// Build the HTTP-backed client and its breaker from configuration.
    pub fn from_config(config: &FrontendConfig) -> Result<Self, ClientBuildError> {
        let base_url = parse_http_url(&config.upstream.base_url)?;
        let upstream = HttpUpstream::new(&base_url)?;
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::from(&config.breaker)));
        Ok(Self::new(upstream, breaker, RetryPolicy::from(&config.upstream)))
    }
}

impl<U: Upstream> ResilientClient<U> {
    pub fn new(upstream: U, breaker: Arc<CircuitBreaker>, policy: RetryPolicy) -> Self {
        Self {
            upstream,
            breaker,
            policy,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `path` from the upstream.
    ///
    /// The breaker is consulted once, up front. Once admitted, the request
    /// may use its whole retry budget even if the breaker opens meanwhile.
    pub async fn fetch(&self, path: &str) -> Result<FetchResult, FetchError> {
        let start = Instant::now();

        if !self.breaker.can_call() {
            let state = self.breaker.current_state();
            tracing::debug!(path = %path, state = %state, "Circuit open, failing fast");
            metrics::record_circuit_rejected();
            return Err(FetchError::CircuitOpen {
                state,
                elapsed: start.elapsed(),
            });
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let attempt_start = Instant::now();

            match with_timeout(self.policy.attempt_timeout, self.upstream.get(path)).await {
                Ok(payload) => {
                    let attempt_latency = attempt_start.elapsed();
                    self.breaker.record_success();
                    metrics::record_attempt("success", attempt_latency);

                    if attempt > 1 {
                        tracing::debug!(path = %path, attempts = attempt, "Upstream succeeded after retries");
                    }
                    return Ok(FetchResult {
                        payload,
                        attempts: attempt,
                        breaker_state: self.breaker.current_state(),
                        total_latency: start.elapsed(),
                        attempt_latency,
                    });
                }
                Err(error) => {
                    let attempt_latency = attempt_start.elapsed();
                    self.breaker.record_failure();
                    metrics::record_attempt("failure", attempt_latency);

                    tracing::warn!(
                        path = %path,
                        attempt = attempt,
                        error = %error,
                        latency = ?attempt_latency,
                        "Upstream attempt failed"
                    );

                    if self.policy.is_exhausted(attempt) {
                        return Err(FetchError::RetriesExhausted {
                            last_error: error,
                            attempts: attempt,
                            breaker_state: self.breaker.current_state(),
                            total_latency: start.elapsed(),
                        });
                    }

                    let backoff = self.policy.backoff(attempt);
                    tracing::debug!(path = %path, attempt = attempt, delay = ?backoff, "Retrying request");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
