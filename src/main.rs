//! Faultline front-end service.
//!
//! ```text
//!     Client                  ┌──────────────────────────────────────────────┐
//!     GET /process ──────────▶│ http::server  ──▶  resilience::client        │
//!                             │                      │ breaker gate          │
//!                             │                      │ timed attempts ───────┼──▶ upstream /work
//!                             │                      │ retry + backoff       │
//!     ◀─── ProcessResponse ───│ stats + metrics ◀────┘                       │
//!                             └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use faultline::config::load_frontend_config;
use faultline::http::{AppState, HttpServer};
use faultline::lifecycle::{signals, startup, Shutdown};
use faultline::observability::logging;
use faultline::resilience::ResilientClient;

#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Front-end service calling a flaky upstream through a circuit breaker", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_frontend_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("faultline v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        timeout_secs = config.upstream.timeout_secs,
        max_retries = config.upstream.max_retries,
        failure_threshold = config.breaker.failure_threshold,
        cool_down_secs = config.breaker.cool_down_secs,
        "Configuration loaded"
    );

    let metrics = startup::init_metrics(&config.observability);

    let client = Arc::new(ResilientClient::from_config(&config)?);
    let mut state = AppState::new(client, &config.upstream.work_path);
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let listener = startup::bind_listener(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    let signal = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    HttpServer::new(config, state).run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
