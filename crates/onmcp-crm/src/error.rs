use thiserror::Error;

/// Errors surfaced once a [`crate::CrmResponse`] is turned into a `Result`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrmError {
    /// The request never produced a usable response (status `0`).
    #[error("CRM unreachable: {0}")]
    Transport(String),

    /// The CRM answered with a non-2xx status.
    #[error("CRM rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Errors building the client itself.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid CRM base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// A credential required for a scope is not available.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Agency API key not configured")]
    AgencyKeyMissing,

    #[error("Private Integration Token not configured")]
    PrivateIntegrationTokenMissing,

    #[error("Location API key not provided")]
    LocationKeyMissing,

    #[error("OAuth access token not provided")]
    OAuthTokenMissing,

    #[error("OAuth client credentials not configured")]
    OAuthClientMissing,
}
