//! HTTP server for the front-end service.
//!
//! # Responsibilities
//! - Create Axum Router with `/process`, `/health`, `/metrics`
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Call the upstream through the injected `ResilientClient`
//! - Record request statistics for `/metrics`
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::FrontendConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{millis, prometheus_response, HealthResponse, ProcessResponse};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::observability::stats::RequestStats;
use crate::resilience::ResilientClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ResilientClient>,
    pub stats: Arc<RequestStats>,
    pub metrics: Option<PrometheusHandle>,
    pub work_path: Arc<str>,
}

impl AppState {
    pub fn new(client: Arc<ResilientClient>, work_path: &str) -> Self {
        Self {
            client,
            stats: Arc::new(RequestStats::new()),
            metrics: None,
            work_path: Arc::from(work_path),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// HTTP server for the front-end service.
pub struct HttpServer {
    router: Router,
    config: FrontendConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and state.
    pub fn new(config: FrontendConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `/process` sits outside the request timeout: the client already bounds
    /// every attempt, and cutting a fetch short would drop its JSON reply and
    /// its stats.
    #[allow(deprecated)]
    fn build_router(config: &FrontendConfig, state: AppState) -> Router {
        let timed_routes = Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/process", get(process_handler))
            .merge(timed_routes)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
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
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }
}

/// Fetch from the upstream and report the outcome. Never fails.
async fn process_handler(State(state): State<AppState>, headers: HeaderMap) -> Json<ProcessResponse> {
    let request_id = request_id(&headers);

    let (response, attempt_ms) = match state.client.fetch(&state.work_path).await {
        Ok(result) => {
            let attempt_ms = millis(result.attempt_latency);
            (ProcessResponse::from(result), Some(attempt_ms))
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                attempts = err.attempts(),
                breaker_state = %err.breaker_state(),
                error = %err,
                "Process request failed"
            );
            (ProcessResponse::from(err), None)
        }
    };

    tracing::debug!(
        request_id = %request_id,
        ok = response.ok,
        attempts = response.attempts,
        total_latency_ms = response.total_latency_ms,
        "Process request completed"
    );

    state.stats.record(response.ok, response.total_latency_ms, attempt_ms);
    metrics::record_frontend_request(response.ok);
    Json(response)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        breaker_state: state.client.breaker().current_state(),
    })
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    if state.metrics.is_some() {
        metrics::publish_frontend_snapshot(&state.stats.snapshot());
        metrics::record_breaker_state(state.client.breaker().current_state());
    }
    prometheus_response(state.metrics.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    /// Server whose upstream is a port with nothing listening.
    fn unreachable_server(max_retries: u32, threshold: u32) -> HttpServer {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = FrontendConfig::default();
        config.upstream.base_url = format!("http://{}", addr);
        config.upstream.max_retries = max_retries;
        config.upstream.backoff_base_ms = 1;
        config.breaker.failure_threshold = threshold;
        config.breaker.cool_down_secs = 60.0;

        let client = Arc::new(ResilientClient::from_config(&config).unwrap());
        let state = AppState::new(client, &config.upstream.work_path);
        HttpServer::new(config, state)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = unreachable_server(0, 5);
        let (status, headers, body) = get_json(server.router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["breaker_state"], "closed");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_process_reports_failure_in_body() {
        let server = unreachable_server(1, 5);
        let (status, _, body) = get_json(server.router(), "/process").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], false);
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["attempts"], 2);
        let note = body["note"].as_str().unwrap();
        assert!(note.starts_with("failure: all retries failed: transport error"), "{}", note);
    }

    #[tokio::test]
    async fn test_process_fails_fast_once_open() {
        let server = unreachable_server(0, 1);
        let router = server.router();

        let (_, _, first) = get_json(router.clone(), "/process").await;
        assert_eq!(first["attempts"], 1);
        assert_eq!(first["breaker_state"], "open");

        let (_, _, second) = get_json(router.clone(), "/process").await;
        assert_eq!(second["ok"], false);
        assert_eq!(second["attempts"], 0);
        assert_eq!(second["note"], "failure: CircuitBreakerOpen (state=open)");

        let (_, _, health) = get_json(router, "/health").await;
        assert_eq!(health["breaker_state"], "open");
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_echoed() {
        let server = unreachable_server(0, 5);
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_metrics_disabled_without_recorder() {
        let server = unreachable_server(0, 5);
        let response = server
            .router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
