//! Configuration loading from disk and the environment.
//!
//! Precedence, lowest first: built-in defaults, the TOML file (if given),
//! environment variables. The result is validated before it is returned.

use std::fmt::Display;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::{FrontendConfig, ListenerConfig, UpstreamServiceConfig};
use crate::config::validation::{validate_frontend, validate_upstream_service, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {name}='{value}' is invalid: {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the front-end config from an optional file plus process environment.
pub fn load_frontend_config(path: Option<&Path>) -> Result<FrontendConfig, ConfigError> {
    let mut config: FrontendConfig = match path {
        Some(path) => read_toml(path)?,
        None => FrontendConfig::default(),
    };
    apply_frontend_env(&mut config, process_env)?;
    validate_frontend(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load the upstream service config from an optional file plus process environment.
pub fn load_upstream_config(path: Option<&Path>) -> Result<UpstreamServiceConfig, ConfigError> {
    let mut config: UpstreamServiceConfig = match path {
        Some(path) => read_toml(path)?,
        None => UpstreamServiceConfig::default(),
    };
    apply_upstream_env(&mut config, process_env)?;
    validate_upstream_service(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read and deserialize a TOML file.
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply `SERVICE_B_URL`, `REQUEST_TIMEOUT_S`, `MAX_RETRIES`,
/// `FAILURE_THRESHOLD`, `COOL_DOWN_SECONDS`, `RETRY_BACKOFF_BASE_MS`,
/// `PORT` and `LOG_LEVEL`.
pub fn apply_frontend_env<F>(config: &mut FrontendConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("SERVICE_B_URL") {
        config.upstream.base_url = url;
    }
    if let Some(v) = parse_env(&lookup, "REQUEST_TIMEOUT_S")? {
        config.upstream.timeout_secs = v;
    }
    if let Some(v) = parse_env(&lookup, "MAX_RETRIES")? {
        config.upstream.max_retries = v;
    }
    if let Some(v) = parse_env(&lookup, "RETRY_BACKOFF_BASE_MS")? {
        config.upstream.backoff_base_ms = v;
    }
    if let Some(v) = parse_env(&lookup, "FAILURE_THRESHOLD")? {
        config.breaker.failure_threshold = v;
    }
    if let Some(v) = parse_env(&lookup, "COOL_DOWN_SECONDS")? {
        config.breaker.cool_down_secs = v;
    }
    if let Some(port) = parse_env(&lookup, "PORT")? {
        set_port(&mut config.listener, port);
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}

/// Apply `FAILURE_RATE`, `MAX_LATENCY_MS`, `BASE_LATENCY_MS`, `PORT` and
/// `LOG_LEVEL`.
pub fn apply_upstream_env<F>(config: &mut UpstreamServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = parse_env(&lookup, "FAILURE_RATE")? {
        config.faults.failure_rate = v;
    }
    if let Some(v) = parse_env(&lookup, "MAX_LATENCY_MS")? {
        config.faults.max_latency_ms = v;
    }
    if let Some(v) = parse_env(&lookup, "BASE_LATENCY_MS")? {
        config.faults.base_latency_ms = v;
    }
    if let Some(port) = parse_env(&lookup, "PORT")? {
        set_port(&mut config.listener, port);
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_env<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        })
}

/// Replace the port of the bind address, keeping its host when parseable.
fn set_port(listener: &mut ListenerConfig, port: u16) {
    let mut addr = listener
        .bind_address
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));
    addr.set_port(port);
    listener.bind_address = addr.to_string();
}
