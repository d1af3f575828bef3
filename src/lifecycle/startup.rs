//! Startup helpers shared by the service binaries.
//!
//! Order: config → logging → metrics recorder → subsystems → listener.
//! Any startup error is fatal.

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;

use crate::config::ObservabilityConfig;
use crate::observability::metrics;

/// Install the Prometheus recorder if metrics are enabled.
///
/// A failed install is logged and the service runs without `/metrics`.
pub fn init_metrics(config: &ObservabilityConfig) -> Option<PrometheusHandle> {
    if !config.metrics_enabled {
        tracing::info!("Metrics disabled");
        return None;
    }
    match metrics::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

/// Bind the service listener and log the resolved address.
pub async fn bind_listener(bind_address: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
