use crate::app_config::{
    AppConfig, CrmConfig, Environment, McpServerConfig, DEFAULT_CRM_API_BASE,
    DEFAULT_CRM_API_VERSION, DEFAULT_ONMCP_URL,
};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset so `CRM_PIT_KEY=` in a .env file behaves
    // the same as leaving the line out.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ONMCP_ENV", "development"));
    let bind_addr = parse_addr("ONMCP_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ONMCP_LOG_LEVEL", "info");
    let api_keys = parse_api_keys(&or_default("ONMCP_API_KEYS", ""));

    let db_max_connections = parse_u32("ONMCP_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ONMCP_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ONMCP_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let onmcp_url = or_default("ONMCP_URL", DEFAULT_ONMCP_URL)
        .trim_end_matches('/')
        .to_string();
    let mcp_servers = parse_mcp_servers(&or_default("ONMCP_MCP_SERVERS", ""))?;
    let sync_cron = optional("ONMCP_SYNC_CRON");
    let sync_max_pages = parse_u32("ONMCP_SYNC_MAX_PAGES", "500")?;
    if sync_max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "ONMCP_SYNC_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let crm = CrmConfig {
        agency_api_key: optional("CRM_AGENCY_API_KEY"),
        pit_key: optional("CRM_PIT_KEY"),
        client_id: optional("CRM_CLIENT_ID"),
        client_secret: optional("CRM_CLIENT_SECRET"),
        api_base: or_default("CRM_API_BASE", DEFAULT_CRM_API_BASE),
        api_version: or_default("CRM_API_VERSION", DEFAULT_CRM_API_VERSION),
        request_timeout_secs: parse_u64("CRM_REQUEST_TIMEOUT_SECS", "30")?,
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        api_keys,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        onmcp_url,
        mcp_servers,
        sync_cron,
        sync_max_pages,
        crm,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parses `name=url,name=url` into server entries.
fn parse_mcp_servers(raw: &str) -> Result<Vec<McpServerConfig>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (name, url) = entry
                .split_once('=')
                .map(|(n, u)| (n.trim(), u.trim()))
                .filter(|(n, u)| !n.is_empty() && !u.is_empty())
                .ok_or_else(|| ConfigError::InvalidEnvVar {
                    var: "ONMCP_MCP_SERVERS".to_string(),
                    reason: format!("expected name=url, got '{entry}'"),
                })?;
            Ok(McpServerConfig {
                name: name.to_string(),
                url: url.trim_end_matches('/').to_string(),
            })
        })
        .collect()
}
