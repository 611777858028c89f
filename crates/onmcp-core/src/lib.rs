pub mod app_config;
pub mod catalog;
pub mod config;
pub mod status;

pub use app_config::{AppConfig, CrmConfig, Environment, McpServerConfig};
pub use catalog::{
    load_catalog, parse_catalog, Badge, Catalog, CatalogService, CatalogStats, CategorySummary,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use status::{AgencyStatus, SyncLogStatus, UnknownStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to parse catalog: {0}")]
    CatalogParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    CatalogInvalid(String),
}
