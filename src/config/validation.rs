//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the config
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::{FrontendConfig, ListenerConfig, UpstreamServiceConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("{field} '{value}' is not a valid http(s) URL: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub fn validate_frontend(config: &FrontendConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_listener(&config.listener, &mut errors);

    if let Err(e) = parse_http_url(&config.upstream.base_url) {
        errors.push(e);
    }
    if !config.upstream.work_path.starts_with('/') {
        errors.push(ValidationError::InvalidUrl {
            field: "upstream.work_path",
            value: config.upstream.work_path.clone(),
            reason: "must start with '/'".to_string(),
        });
    }
    let timeout = config.upstream.timeout_secs;
    if timeout.is_nan() || timeout <= 0.0 {
        errors.push(ValidationError::NotPositive {
            field: "upstream.timeout_secs",
        });
    } else if !fits_duration(timeout) {
        errors.push(ValidationError::OutOfRange {
            field: "upstream.timeout_secs",
            value: timeout,
            min: 0.0,
            max: max_duration_secs(),
        });
    }
    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::NotPositive {
            field: "breaker.failure_threshold",
        });
    }
    let cool_down = config.breaker.cool_down_secs;
    if !(cool_down >= 0.0 && fits_duration(cool_down)) {
        errors.push(ValidationError::OutOfRange {
            field: "breaker.cool_down_secs",
            value: cool_down,
            min: 0.0,
            max: max_duration_secs(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive {
            field: "timeouts.request_secs",
        });
    }

    finish(errors)
}

pub fn validate_upstream_service(config: &UpstreamServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_listener(&config.listener, &mut errors);

    let rate = config.faults.failure_rate;
    if !(0.0..=1.0).contains(&rate) {
        errors.push(ValidationError::OutOfRange {
            field: "faults.failure_rate",
            value: rate,
            min: 0.0,
            max: 1.0,
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive {
            field: "timeouts.request_secs",
        });
    }

    finish(errors)
}

/// Parse the upstream base URL, accepting only http and https.
pub fn parse_http_url(value: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        field: "upstream.base_url",
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

/// Whether `secs` converts to a `Duration` without saturating.
fn fits_duration(secs: f64) -> bool {
    Duration::try_from_secs_f64(secs).is_ok()
}

fn max_duration_secs() -> f64 {
    Duration::MAX.as_secs_f64()
}

fn check_listener(listener: &ListenerConfig, errors: &mut Vec<ValidationError>) {
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            listener.bind_address.clone(),
        ));
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
