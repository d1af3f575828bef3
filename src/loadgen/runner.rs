//! Open-loop request driver.

use std::time::Duration;

use futures_util::future::join_all;
use serde::Deserialize;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

/// Breaker state recorded when the request itself failed.
pub const REQUEST_FAILED: &str = "request_failed";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LoadError {
    #[error("rate must be a positive finite number of requests per second, got {0}")]
    InvalidRate(f64),

    #[error("run duration {0:?} is too long")]
    InvalidDuration(Duration),
}

/// Outcome of one load-generator request.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub ok: bool,
    pub latency_ms: f64,
    pub breaker_state: String,
    /// `-1` when the reply did not say.
    pub attempts: i64,
}

impl LoadOutcome {
    fn request_failed(latency_ms: f64) -> Self {
        Self {
            ok: false,
            latency_ms,
            breaker_state: REQUEST_FAILED.to_string(),
            attempts: -1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessReply {
    #[serde(default)]
    ok: bool,
    #[serde(default = "unknown_state")]
    breaker_state: String,
    #[serde(default = "unknown_attempts")]
    attempts: i64,
}

fn unknown_state() -> String {
    "unknown".to_string()
}

fn unknown_attempts() -> i64 {
    -1
}

/// Interpret a `/process` reply body. Fields missing from the body fall
/// back to `ok=false`, `unknown` and `-1`.
pub fn parse_reply(body: &[u8], latency_ms: f64) -> LoadOutcome {
    match serde_json::from_slice::<ProcessReply>(body) {
        Ok(reply) => LoadOutcome {
            ok: reply.ok,
            latency_ms,
            breaker_state: reply.breaker_state,
            attempts: reply.attempts,
        },
        Err(_) => LoadOutcome::request_failed(latency_ms),
    }
}

/// Issue one GET and classify the reply. Never retries.
pub async fn fire_once(client: &reqwest::Client, url: &Url, timeout: Duration) -> LoadOutcome {
    let start = Instant::now();
    let body = async {
        let response = client.get(url.clone()).timeout(timeout).send().await?;
        response.bytes().await
    }
    .await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    match body {
        Ok(bytes) => parse_reply(&bytes, latency_ms),
        Err(e) => {
            tracing::debug!(error = %e, "Load request failed");
            LoadOutcome::request_failed(latency_ms)
        }
    }
}

/// Interval between requests for `rps`.
///
/// Rejects rates that are not positive and finite, and rates so high that
/// the period rounds down to zero.
pub fn tick_period(rps: f64) -> Result<Duration, LoadError> {
    if !rps.is_finite() || rps <= 0.0 {
        return Err(LoadError::InvalidRate(rps));
    }
    match Duration::try_from_secs_f64(1.0 / rps) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(LoadError::InvalidRate(rps)),
    }
}

/// Spawn one request per `1 / rps` seconds until `duration` has passed,
/// then wait for every request to finish.
///
/// The rate is not adjusted for slow replies: requests overlap freely.
pub async fn run_load(
    client: reqwest::Client,
    url: Url,
    rps: f64,
    duration: Duration,
    timeout: Duration,
) -> Result<Vec<LoadOutcome>, LoadError> {
    let period = tick_period(rps)?;
    let start = Instant::now();
    let deadline = start
        .checked_add(duration)
        .ok_or(LoadError::InvalidDuration(duration))?;

    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tasks = Vec::new();
    loop {
        ticker.tick().await;
        if Instant::now() >= deadline {
            break;
        }
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            fire_once(&client, &url, timeout).await
        }));
    }

    tracing::info!(requests = tasks.len(), "Load phase finished, awaiting replies");

    let outcomes = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap_or_else(|_| LoadOutcome::request_failed(0.0)))
        .collect();
    Ok(outcomes)
}
