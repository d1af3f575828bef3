//! Faultline: resilient HTTP calls against a flaky dependency.
//!
//! A front-end service that fetches from an upstream through a circuit
//! breaker, per-attempt timeouts and retries with backoff, plus the
//! fault-injecting upstream and an open-loop load generator to exercise it.

pub mod config;
pub mod faults;
pub mod http;
pub mod lifecycle;
pub mod loadgen;
pub mod observability;
pub mod resilience;

pub use config::schema::{FrontendConfig, UpstreamServiceConfig};
pub use faults::UpstreamServer;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{CircuitBreaker, ResilientClient};
