//! Upstream dependency access.
//!
//! [`Upstream`] is the seam between the retry loop and the network: one
//! idempotent GET that yields decoded JSON or an [`AttemptError`]. The
//! deadline is applied by the caller, so implementations do not need their
//! own timeout.

use std::future::Future;

use serde_json::Value;
use url::Url;

use crate::resilience::error::AttemptError;
use crate::resilience::retries::is_server_fault;

/// A dependency reachable through a single read operation.
pub trait Upstream: Send + Sync {
    fn get(&self, path: &str) -> impl Future<Output = Result<Value, AttemptError>> + Send;
}

/// [`Upstream`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &Url) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("faultline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: reqwest::Client, base_url: &Url) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Upstream for HttpUpstream {
    async fn get(&self, path: &str) -> Result<Value, AttemptError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if is_server_fault(status) {
            return Err(AttemptError::UpstreamFault {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| AttemptError::Decode(e.to_string()))
    }
}
