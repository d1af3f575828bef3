//! Fault-injecting upstream service.
//!
//! Serves `GET /work` with configurable latency and failure rate.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use faultline::config::load_upstream_config;
use faultline::faults::{UpstreamServer, UpstreamState};
use faultline::lifecycle::{signals, startup, Shutdown};
use faultline::observability::logging;

#[derive(Parser)]
#[command(name = "faultline-upstream")]
#[command(about = "Upstream service with injected latency and failures", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_upstream_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("faultline-upstream v{} starting", env!("CARGO_PKG_VERSION"));

    let metrics = startup::init_metrics(&config.observability);

    let mut state = UpstreamState::new(&config);
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let listener = startup::bind_listener(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    let signal = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    UpstreamServer::new(config, state).run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
