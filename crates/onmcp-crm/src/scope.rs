//! Credential scopes and token resolution.

use onmcp_core::CrmConfig;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// Which credential a request is made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    /// Agency master API key (`CRM_AGENCY_API_KEY`).
    Agency,
    /// Marketplace Private Integration Token (`CRM_PIT_KEY`).
    PrivateIntegration,
    /// Per-location API key, always supplied by the caller.
    Location,
    /// OAuth access token, always supplied by the caller.
    OAuth,
}

impl TokenScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::Agency => "agency",
            TokenScope::PrivateIntegration => "private_integration",
            TokenScope::Location => "location",
            TokenScope::OAuth => "oauth",
        }
    }

    /// The configured credential for this scope and the error reported when
    /// neither it nor a caller token is present.
    fn lookup(self, config: &CrmConfig) -> (Option<&str>, CredentialError) {
        match self {
            TokenScope::Agency => (
                config.agency_api_key.as_deref(),
                CredentialError::AgencyKeyMissing,
            ),
            TokenScope::PrivateIntegration => (
                config.pit_key.as_deref(),
                CredentialError::PrivateIntegrationTokenMissing,
            ),
            TokenScope::Location => (None, CredentialError::LocationKeyMissing),
            TokenScope::OAuth => (None, CredentialError::OAuthTokenMissing),
        }
    }
}

impl std::fmt::Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the credential for `scope`.
///
/// A non-blank caller-supplied token always wins; otherwise the agency and
/// PIT scopes fall back to configuration.
///
/// # Errors
///
/// Returns the scope's [`CredentialError`] when no credential is available.
pub fn resolve_token<'a>(
    config: &'a CrmConfig,
    scope: TokenScope,
    provided: Option<&'a str>,
) -> Result<&'a str, CredentialError> {
    if let Some(token) = provided.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token);
    }
    let (configured, missing) = scope.lookup(config);
    configured.ok_or(missing)
}
