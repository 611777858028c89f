//! Status enumerations shared by the store, the sync pipeline and the API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Connection status of the singleton agency configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgencyStatus {
    Active,
    Syncing,
    Error,
}

impl AgencyStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgencyStatus::Active => "active",
            AgencyStatus::Syncing => "syncing",
            AgencyStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AgencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<String> for AgencyStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, UnknownStatus> {
        value.parse()
    }
}

impl std::str::FromStr for AgencyStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AgencyStatus::Active),
            "syncing" => Ok(AgencyStatus::Syncing),
            "error" => Ok(AgencyStatus::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Lifecycle of one sync log entry: `running` until finalized exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    Running,
    Completed,
    Failed,
}

impl SyncLogStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncLogStatus::Running => "running",
            SyncLogStatus::Completed => "completed",
            SyncLogStatus::Failed => "failed",
        }
    }

}

impl std::fmt::Display for SyncLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<String> for SyncLogStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for SyncLogStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(SyncLogStatus::Running),
            "completed" => Ok(SyncLogStatus::Completed),
            "failed" => Ok(SyncLogStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
