//! Load testing for the front-end service.

use std::time::Duration;

use faultline::lifecycle::Shutdown;
use faultline::loadgen::{run_load, LoadSummary};
use url::Url;

mod common;

#[tokio::test]
async fn test_load_against_healthy_stack() {
    let shutdown = Shutdown::new();
    let upstream = common::start_upstream(0.0, &shutdown).await;
    let frontend = common::start_frontend(common::frontend_config(upstream), &shutdown).await;

    let url = Url::parse(&format!("http://{}/process", frontend)).unwrap();
    let outcomes = run_load(
        reqwest::Client::new(),
        url,
        40.0,
        Duration::from_millis(500),
        Duration::from_secs(2),
    )
    .await
    .unwrap();

    let summary = LoadSummary::from_outcomes(&outcomes);
    println!("{}", summary);

    assert!(summary.total >= 10, "total = {}", summary.total);
    assert_eq!(summary.success, summary.total);
    assert_eq!(summary.breaker_states.get("closed"), Some(&summary.total));
    assert!(summary.successful.is_some());

    shutdown.trigger();
}

#[tokio::test]
async fn test_load_against_dead_upstream_opens_breaker() {
    let shutdown = Shutdown::new();
    let upstream = common::start_upstream(1.0, &shutdown).await;

    let mut config = common::frontend_config(upstream);
    config.breaker.failure_threshold = 2;
    config.breaker.cool_down_secs = 30.0;
    config.upstream.max_retries = 1;
    let frontend = common::start_frontend(config, &shutdown).await;

    let url = Url::parse(&format!("http://{}/process", frontend)).unwrap();
    let outcomes = run_load(
        reqwest::Client::new(),
        url,
        20.0,
        Duration::from_millis(500),
        Duration::from_secs(2),
    )
    .await
    .unwrap();

    let summary = LoadSummary::from_outcomes(&outcomes);
    assert_eq!(summary.success, 0);
    assert!(summary.successful.is_none());
    assert!(summary.breaker_states.get("open").copied().unwrap_or(0) > 0);
    assert!(summary.to_string().contains("n/a"));

    shutdown.trigger();
}
