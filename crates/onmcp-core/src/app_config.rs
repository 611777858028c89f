use std::net::SocketAddr;

pub const DEFAULT_CRM_API_BASE: &str = "https://services.leadconnectorhq.com";
pub const DEFAULT_CRM_API_VERSION: &str = "2021-07-28";
pub const DEFAULT_ONMCP_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Credentials and endpoint settings for the external CRM.
///
/// Built once at process start and handed to the CRM client; nothing else in
/// the workspace reads `CRM_*` variables.
#[derive(Clone, PartialEq, Eq)]
pub struct CrmConfig {
    pub agency_api_key: Option<String>,
    pub pit_key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            agency_api_key: None,
            pit_key: None,
            client_id: None,
            client_secret: None,
            api_base: DEFAULT_CRM_API_BASE.to_string(),
            api_version: DEFAULT_CRM_API_VERSION.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl CrmConfig {
    /// `true` when at least one agency-level credential is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.agency_api_key.is_some() || self.pit_key.is_some()
    }
}

impl std::fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("CrmConfig")
            .field("agency_api_key", &redact(&self.agency_api_key))
            .field("pit_key", &redact(&self.pit_key))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// An additional MCP server probed by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerConfig {
    pub name: String,
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_keys: Vec<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub onmcp_url: String,
    pub mcp_servers: Vec<McpServerConfig>,
    pub sync_cron: Option<String>,
    pub sync_max_pages: u32,
    pub crm: CrmConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("onmcp_url", &self.onmcp_url)
            .field("mcp_servers", &self.mcp_servers)
            .field("sync_cron", &self.sync_cron)
            .field("sync_max_pages", &self.sync_max_pages)
            .field("crm", &self.crm)
            .finish()
    }
}
