//! HTTP client for the 0nMCP orchestrator the API fronts.
//!
//! Health probes carry a short per-request timeout so a dead upstream never
//! stalls the dashboard; tool execution uses the client-wide timeout.

use std::time::{Duration, Instant};

use reqwest::Client;
use thiserror::Error;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const EXECUTE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("0nMCP unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("0nMCP responded with status {0}")]
    Status(u16),

    #[error("0nMCP returned a non-JSON body: {0}")]
    InvalidBody(String),
}

/// One successful health probe.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    pub body: serde_json::Value,
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// # Errors
    ///
    /// Returns [`UpstreamError::Unreachable`] if the `reqwest` client cannot
    /// be constructed.
    pub fn new(base_url: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(EXECUTE_TIMEOUT)
            .connect_timeout(HEALTH_TIMEOUT)
            .user_agent("onmcp-server/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}/api/health` on the primary upstream.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] when the server is unreachable, answers
    /// non-2xx, or answers with something other than JSON.
    pub async fn health(&self) -> Result<HealthProbe, UpstreamError> {
        self.probe(&self.base_url).await
    }

    /// `GET {server_url}/api/health` on any MCP server.
    ///
    /// # Errors
    ///
    /// Same as [`UpstreamClient::health`].
    pub async fn probe(&self, server_url: &str) -> Result<HealthProbe, UpstreamError> {
        let url = format!("{}/api/health", server_url.trim_end_matches('/'));
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        let body = json_body(response).await?;

        Ok(HealthProbe {
            body,
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// `POST {base}/api/execute` with the caller's body passed through.
    ///
    /// # Errors
    ///
    /// Same as [`UpstreamClient::health`].
    pub async fn execute(
        &self,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, UpstreamError> {
        let url = format!("{}/api/execute", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        json_body(response).await
    }
}

async fn json_body(response: reqwest::Response) -> Result<serde_json::Value, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status(status.as_u16()));
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
}
