//! Shared utilities for integration and load testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use faultline::config::{FrontendConfig, UpstreamServiceConfig};
use faultline::faults::{UpstreamServer, UpstreamState};
use faultline::http::{AppState, HttpServer};
use faultline::lifecycle::Shutdown;
use faultline::resilience::ResilientClient;

/// Start a programmable upstream on an ephemeral port.
///
/// `f` is called once per request and returns the status code and JSON body.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

#[allow(dead_code)]
async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Front-end config pointing at `upstream` with fast retries.
#[allow(dead_code)]
pub fn frontend_config(upstream: SocketAddr) -> FrontendConfig {
    let mut config = FrontendConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.backoff_base_ms = 10;
    config.observability.metrics_enabled = false;
    config
}

/// Start the front-end service and return its address.
#[allow(dead_code)]
pub async fn start_frontend(config: FrontendConfig, shutdown: &Shutdown) -> SocketAddr {
    let client = Arc::new(ResilientClient::from_config(&config).unwrap());
    let state = AppState::new(client, &config.upstream.work_path);
    start_frontend_with_state(config, state, shutdown).await
}

#[allow(dead_code)]
pub async fn start_frontend_with_state(
    config: FrontendConfig,
    state: AppState,
    shutdown: &Shutdown,
) -> SocketAddr {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, state);
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Start the fault-injecting upstream with no latency and the given failure rate.
#[allow(dead_code)]
pub async fn start_upstream(failure_rate: f64, shutdown: &Shutdown) -> SocketAddr {
    let mut config = UpstreamServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.faults.failure_rate = failure_rate;
    config.faults.base_latency_ms = 0;
    config.faults.max_latency_ms = 0;
    config.faults.host = Some("test-upstream".to_string());
    config.observability.metrics_enabled = false;

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = UpstreamState::new(&config);
    let server = UpstreamServer::new(config, state);
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// GET `/process` on the front-end and return the JSON body.
#[allow(dead_code)]
pub async fn process(frontend: SocketAddr) -> serde_json::Value {
    reqwest::Client::new()
        .get(format!("http://{}/process", frontend))
        .send()
        .await
        .expect("front-end unreachable")
        .json()
        .await
        .expect("front-end reply is not JSON")
}
