//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! field has a default so a missing file or section is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::circuit_breaker::CircuitBreakerConfig;

/// Seconds to a [`Duration`], saturating at `Duration::MAX`.
///
/// Negative and NaN inputs give zero; validation rejects both before a
/// config is accepted.
pub fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

/// Root configuration for the front-end service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontendConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream dependency and retry settings.
    pub upstream: UpstreamConfig,

    /// Circuit breaker thresholds.
    pub breaker: BreakerConfig,

    /// Inbound request timeout.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Root configuration for the fault-injecting upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamServiceConfig {
    pub listener: ListenerConfig,

    /// Injected latency and failure settings.
    pub faults: FaultConfig,

    pub timeouts: TimeoutConfig,

    pub observability: ObservabilityConfig,
}

impl Default for UpstreamServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig {
                bind_address: "0.0.0.0:8001".to_string(),
            },
            faults: FaultConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Upstream dependency settings for the resilient client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the upstream service.
    pub base_url: String,

    /// Path fetched for each `/process` request.
    pub work_path: String,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: f64,

    /// Attempts allowed beyond the first.
    pub max_retries: u32,

    /// Backoff after the first failed attempt, in milliseconds.
    pub backoff_base_ms: u64,
}

impl UpstreamConfig {
    pub fn attempt_timeout(&self) -> Duration {
        secs_to_duration(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://service-b:8001".to_string(),
            work_path: "/work".to_string(),
            timeout_secs: 0.5,
            max_retries: 2,
            backoff_base_ms: 50,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a trial call.
    pub cool_down_secs: f64,
}

impl BreakerConfig {
    pub fn cool_down(&self) -> Duration {
        secs_to_duration(self.cool_down_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down_secs: 5.0,
        }
    }
}

impl From<&BreakerConfig> for CircuitBreakerConfig {
    fn from(config: &BreakerConfig) -> Self {
        CircuitBreakerConfig::new(config.failure_threshold, config.cool_down())
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds for routes without their own deadline.
    ///
    /// The front-end's `/process` is bounded by the client's per-attempt
    /// timeout and retry budget instead.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Fault injection settings for the upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Probability in [0, 1] that `/work` fails with a 500.
    pub failure_rate: f64,

    /// Fixed delay applied to every `/work` call, in milliseconds.
    pub base_latency_ms: u64,

    /// Upper bound of the uniform random extra delay, in milliseconds.
    pub max_latency_ms: u64,

    /// Host name reported in `/work` responses; the machine's name if unset.
    pub host: Option<String>,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.3,
            base_latency_ms: 30,
            max_latency_ms: 800,
            host: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
