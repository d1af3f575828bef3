//! HTTP server for the fault-injecting upstream service.
//!
//! # Responsibilities
//! - `/work`: simulate work latency, then fail or answer per the fault plan
//! - `/health`, `/metrics`
//! - Record every `/work` call (including failures) in request stats

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::time::Instant;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::UpstreamServiceConfig;
use crate::faults::injector::FaultInjector;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{millis, prometheus_response};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::observability::stats::RequestStats;

/// Body of a successful `GET /work`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkResponse {
    pub status: String,
    pub host: String,
    pub processing_ms: u64,
}

/// State injected into the upstream handlers.
#[derive(Clone)]
pub struct UpstreamState {
    pub injector: Arc<FaultInjector>,
    pub stats: Arc<RequestStats>,
    pub metrics: Option<PrometheusHandle>,
    pub host: Arc<str>,
}

impl UpstreamState {
    pub fn new(config: &UpstreamServiceConfig) -> Self {
        let host = config.faults.host.clone().unwrap_or_else(local_hostname);
        Self {
            injector: Arc::new(FaultInjector::new(config.faults.clone())),
            stats: Arc::new(RequestStats::new()),
            metrics: None,
            host: Arc::from(host),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// HTTP server for the upstream service.
pub struct UpstreamServer {
    router: Router,
    config: UpstreamServiceConfig,
}

impl UpstreamServer {
    pub fn new(config: UpstreamServiceConfig, state: UpstreamState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    #[allow(deprecated)]
    fn build_router(config: &UpstreamServiceConfig, state: UpstreamState) -> Router {
        Router::new()
            .route("/work", get(work_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            failure_rate = self.config.faults.failure_rate,
            base_latency_ms = self.config.faults.base_latency_ms,
            max_latency_ms = self.config.faults.max_latency_ms,
            "Upstream server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("Upstream server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn work_handler(State(state): State<UpstreamState>) -> Response {
    let start = Instant::now();
    let plan = {
        let mut rng = rand::thread_rng();
        state.injector.plan(&mut rng)
    };

    tokio::time::sleep(plan.base_delay).await;
    tokio::time::sleep(plan.extra_delay).await;

    let latency = start.elapsed();
    state.stats.record(!plan.fail, millis(latency), None);
    metrics::record_upstream_request(!plan.fail);

    if plan.fail {
        tracing::debug!(latency = ?latency, "Injecting simulated failure");
        return (StatusCode::INTERNAL_SERVER_ERROR, "simulated internal failure").into_response();
    }

    Json(WorkResponse {
        status: "ok".to_string(),
        host: state.host.to_string(),
        processing_ms: latency.as_millis() as u64,
    })
    .into_response()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn metrics_handler(State(state): State<UpstreamState>) -> Response {
    if state.metrics.is_some() {
        metrics::publish_upstream_snapshot(&state.stats.snapshot());
    }
    prometheus_response(state.metrics.as_ref())
}
