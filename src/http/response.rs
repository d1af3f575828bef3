//! Response bodies of the front-end service.
//!
//! # Design Decisions
//! - `/process` always answers 200; failures are reported in the body
//! - Every [`FetchError`] maps to `ok = false` with a human-readable note

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::Value;

use crate::resilience::{BreakerState, FetchError, FetchResult};

/// Prometheus text exposition, or 404 when the recorder is not installed.
pub fn prometheus_response(handle: Option<&PrometheusHandle>) -> Response {
    match handle {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Body of `GET /process`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResponse {
    pub ok: bool,
    pub data: Option<Value>,
    pub attempts: u32,
    pub breaker_state: BreakerState,
    pub total_latency_ms: f64,
    pub note: String,
}

impl From<FetchResult> for ProcessResponse {
    fn from(result: FetchResult) -> Self {
        Self {
            ok: true,
            data: Some(result.payload),
            attempts: result.attempts,
            breaker_state: result.breaker_state,
            total_latency_ms: millis(result.total_latency),
            note: "success".to_string(),
        }
    }
}

impl From<FetchError> for ProcessResponse {
    fn from(err: FetchError) -> Self {
        Self {
            ok: false,
            data: None,
            attempts: err.attempts(),
            breaker_state: err.breaker_state(),
            total_latency_ms: millis(err.total_latency()),
            note: format!("failure: {}", err),
        }
    }
}

/// Body of `GET /health` on the front-end.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub breaker_state: BreakerState,
}

pub fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
