//! Open-loop load generator for the front-end `/process` endpoint.

use std::time::Duration;

use clap::Parser;
use url::Url;

use faultline::loadgen::{run_load, LoadSummary};
use faultline::observability::logging;

#[derive(Parser)]
#[command(name = "faultline-loadgen")]
#[command(about = "Fire requests at a fixed rate and summarize latency and breaker states", long_about = None)]
struct Cli {
    /// Endpoint to hit.
    #[arg(long, default_value = "http://localhost:8000/process")]
    url: Url,

    /// Requests per second.
    #[arg(long, default_value_t = 10.0)]
    rps: f64,

    /// How long to keep firing, in seconds.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 1.0)]
    timeout_secs: f64,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let duration = Duration::try_from_secs_f64(cli.seconds)?;
    let timeout = Duration::try_from_secs_f64(cli.timeout_secs)?;

    tracing::info!(url = %cli.url, rps = cli.rps, seconds = cli.seconds, "Starting load run");

    let outcomes = run_load(reqwest::Client::new(), cli.url, cli.rps, duration, timeout).await?;
    print!("{}", LoadSummary::from_outcomes(&outcomes));
    Ok(())
}
