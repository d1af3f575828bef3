//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! ResilientClient::fetch(path):
//!     → circuit_breaker.rs (gate: can_call, once per logical fetch)
//!     → timeouts.rs (bound each attempt by the per-attempt deadline)
//!     → upstream.rs (single GET against the dependency)
//!     → retries.rs (classify outcome, decide whether attempts remain)
//!     → backoff.rs (exponential delay + fixed jitter fraction)
//!     → circuit_breaker.rs (record_success / record_failure per attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Only GET is issued, so every attempt is safe to retry
//! - Circuit breaker prevents cascading failures
//! - Only `CircuitOpen` and `RetriesExhausted` leave the client

pub mod backoff;
pub mod circuit_breaker;
pub mod client;
pub mod error;
pub mod retries;
pub mod timeouts;
pub mod upstream;

pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig};
pub use client::{FetchResult, ResilientClient};
pub use error::{AttemptError, ClientBuildError, FetchError};
pub use retries::RetryPolicy;
pub use upstream::{HttpUpstream, Upstream};
