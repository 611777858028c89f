use axum::{extract::State, Json};
use futures::future::join_all;
use serde::Serialize;

use super::AppState;

const PRIMARY_SERVER_NAME: &str = "0nmcp";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct ServerStatus {
    name: String,
    url: String,
    online: bool,
    tools: u64,
    services: u64,
    latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct StatusSummary {
    total: usize,
    online: usize,
    offline: usize,
    total_tools: u64,
    total_services: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct McpStatus {
    servers: Vec<ServerStatus>,
    summary: StatusSummary,
}

/// Probe the primary 0nMCP server and every configured extra server
/// concurrently.
pub(super) async fn status(State(state): State<AppState>) -> Json<McpStatus> {
    let stats = state.catalog.stats();
    let primary = async {
        let probe = state.upstream.health().await;
        ServerStatus {
            name: PRIMARY_SERVER_NAME.to_string(),
            url: state.upstream.base_url().to_string(),
            online: probe.is_ok(),
            tools: u64::from(stats.total),
            services: u64::from(stats.services),
            latency_ms: probe.ok().map(|p| p.latency_ms),
        }
    };

    let extras = join_all(state.config.mcp_servers.iter().map(|server| {
        let upstream = state.upstream.clone();
        async move {
            match upstream.probe(&server.url).await {
                Ok(probe) => ServerStatus {
                    name: server.name.clone(),
                    url: server.url.clone(),
                    online: true,
                    tools: count_field(&probe.body, "tools"),
                    services: count_field(&probe.body, "services"),
                    latency_ms: Some(probe.latency_ms),
                },
                Err(e) => {
                    tracing::debug!(server = %server.name, error = %e, "mcp server offline");
                    ServerStatus {
                        name: server.name.clone(),
                        url: server.url.clone(),
                        online: false,
                        tools: 0,
                        services: 0,
                        latency_ms: None,
                    }
                }
            }
        }
    }));

    let (primary, extras) = futures::join!(primary, extras);
    let mut servers = Vec::with_capacity(extras.len() + 1);
    servers.push(primary);
    servers.extend(extras);

    let summary = summarize(&servers);
    Json(McpStatus { servers, summary })
}

/// Tool and service totals count online servers only.
fn summarize(servers: &[ServerStatus]) -> StatusSummary {
    let online: Vec<&ServerStatus> = servers.iter().filter(|s| s.online).collect();
    StatusSummary {
        total: servers.len(),
        online: online.len(),
        offline: servers.len() - online.len(),
        total_tools: online.iter().map(|s| s.tools).sum(),
        total_services: online.iter().map(|s| s.services).sum(),
    }
}

/// Numeric count from a health body; arrays count their elements.
fn count_field(body: &serde_json::Value, key: &str) -> u64 {
    match body.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(serde_json::Value::Array(items)) => u64::try_from(items.len()).unwrap_or(u64::MAX),
        _ => 0,
    }
}
