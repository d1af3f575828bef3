//! Metrics collection and exposition.
//!
//! # Metrics
//! - `upstream_attempts_total` (counter): attempts by outcome
//! - `upstream_attempt_duration_seconds` (histogram): per-attempt latency
//! - `circuit_breaker_rejections_total` (counter): fetches failed fast
//! - `circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half_open
//! - `service_a_*` / `service_b_*`: request counters and latency gauges
//!   published from [`StatsSnapshot`] on every scrape
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus recorder is installed once per process by the binary

use std::time::Duration;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::observability::stats::StatsSnapshot;
use crate::resilience::circuit_breaker::BreakerState;

/// Install the global Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

pub fn record_attempt(outcome: &'static str, latency: Duration) {
    counter!("upstream_attempts_total", "outcome" => outcome).increment(1);
    histogram!("upstream_attempt_duration_seconds", "outcome" => outcome)
        .record(latency.as_secs_f64());
}

pub fn record_circuit_rejected() {
    counter!("circuit_breaker_rejections_total").increment(1);
}

pub fn record_breaker_state(state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    };
    gauge!("circuit_breaker_state").set(value);
}

pub fn record_frontend_request(ok: bool) {
    counter!("service_a_requests_total").increment(1);
    if ok {
        counter!("service_a_success_total").increment(1);
    } else {
        counter!("service_a_fail_total").increment(1);
    }
}

pub fn record_upstream_request(ok: bool) {
    counter!("service_b_requests_total").increment(1);
    if ok {
        counter!("service_b_success_total").increment(1);
    } else {
        counter!("service_b_fail_total").increment(1);
    }
}

/// Publish the front-end latency summary as gauges.
pub fn publish_frontend_snapshot(snap: &StatsSnapshot) {
    gauge!("service_a_total_latency_avg_ms").set(snap.avg_total_latency_ms);
    gauge!("service_a_total_latency_p95_ms").set(snap.p95_total_latency_ms);
    gauge!("service_a_single_attempt_latency_avg_ms").set(snap.avg_single_attempt_latency_ms);
    gauge!("service_a_single_attempt_latency_p95_ms").set(snap.p95_single_attempt_latency_ms);
}

/// Publish the upstream service latency summary as gauges.
pub fn publish_upstream_snapshot(snap: &StatsSnapshot) {
    gauge!("service_b_latency_avg_ms").set(snap.avg_total_latency_ms);
    gauge!("service_b_latency_p95_ms").set(snap.p95_total_latency_ms);
}
