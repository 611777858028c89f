//! HTTP plumbing for the CRM REST API.
//!
//! Wraps `reqwest` with bearer auth, the fixed `Version` header and the
//! [`CrmResponse`] convention. Nothing here returns `Err` or panics once the
//! client is built: every failure is folded into the triple.

use std::time::Duration;

use onmcp_core::CrmConfig;
use reqwest::{header, Client, Method, Url};

use crate::error::ClientBuildError;
use crate::response::{extract_error_message, CrmResponse};
use crate::scope::{resolve_token, TokenScope};

const USER_AGENT: &str = "onmcp/0.1 (crm-sync)";
const VERSION_HEADER: &str = "Version";

/// Method, JSON body and query parameters for one call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(method: Method, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            body,
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }
}

/// Client for the CRM REST API.
///
/// Built once from [`CrmConfig`]; point `api_base` at a mock server in tests.
#[derive(Debug, Clone)]
pub struct CrmClient {
    pub(crate) client: Client,
    pub(crate) config: CrmConfig,
    pub(crate) base_url: Url,
}

impl CrmClient {
    /// # Errors
    ///
    /// Returns [`ClientBuildError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ClientBuildError::InvalidBaseUrl`] if `api_base` is
    /// not a valid URL.
    pub fn new(config: &CrmConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        // One trailing slash so `Url::join` appends endpoints instead of
        // replacing the last path segment.
        let normalised = format!("{}/", config.api_base.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientBuildError::InvalidBaseUrl {
            url: config.api_base.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            config: config.clone(),
            base_url,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    /// The agency-level scope to use: the master key when configured,
    /// otherwise the Private Integration Token.
    #[must_use]
    pub fn agency_scope(&self) -> TokenScope {
        if self.config.agency_api_key.is_none() && self.config.pit_key.is_some() {
            TokenScope::PrivateIntegration
        } else {
            TokenScope::Agency
        }
    }

    /// Issue one authenticated call.
    pub async fn request(
        &self,
        endpoint: &str,
        token: &str,
        options: RequestOptions,
    ) -> CrmResponse<serde_json::Value> {
        let url = match self.build_url(endpoint, &options.query) {
            Ok(url) => url,
            Err(message) => return CrmResponse::transport(message),
        };

        let mut request = self
            .client
            .request(options.method.clone(), url)
            .bearer_auth(token)
            .header(VERSION_HEADER, &self.config.api_version)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => read_response(response).await,
            Err(e) => {
                tracing::warn!(
                    endpoint,
                    method = %options.method,
                    error = %e,
                    "CRM request failed before a response arrived"
                );
                CrmResponse::transport(e.to_string())
            }
        }
    }

    /// Resolve the credential for `scope`, then issue the call. A missing
    /// credential returns status `0` without touching the network.
    pub async fn request_scoped(
        &self,
        scope: TokenScope,
        provided_token: Option<&str>,
        endpoint: &str,
        options: RequestOptions,
    ) -> CrmResponse<serde_json::Value> {
        let token = match resolve_token(&self.config, scope, provided_token) {
            Ok(token) => token.to_owned(),
            Err(e) => {
                tracing::debug!(scope = %scope, endpoint, "CRM credential missing");
                return CrmResponse::transport(e.to_string());
            }
        };
        self.request(endpoint, &token, options).await
    }

    /// `{base}/{endpoint}?{query}`, with query values percent-encoded.
    pub(crate) fn build_url(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<Url, String> {
        let mut url = self
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| format!("invalid CRM endpoint '{endpoint}': {e}"))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// Fold a received response into the triple.
///
/// A 2xx with an empty body yields `Value::Null`; a 2xx with an unparsable
/// body is a transport-class failure. A non-2xx keeps its status and takes
/// its message from the body when it is JSON.
pub(crate) async fn read_response(response: reqwest::Response) -> CrmResponse<serde_json::Value> {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return CrmResponse::transport(e.to_string()),
    };

    if status.is_success() {
        if text.trim().is_empty() {
            return CrmResponse::success(serde_json::Value::Null, status.as_u16());
        }
        return match serde_json::from_str(&text) {
            Ok(body) => CrmResponse::success(body, status.as_u16()),
            Err(e) => CrmResponse::transport(format!("malformed JSON from CRM: {e}")),
        };
    }

    let body = serde_json::from_str::<serde_json::Value>(&text).ok();
    let message = extract_error_message(body.as_ref(), status);
    tracing::debug!(status = status.as_u16(), %message, "CRM rejected request");
    CrmResponse::rejected(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base: &str) -> CrmClient {
        CrmClient::new(&CrmConfig {
            api_base: base.to_string(),
            ..CrmConfig::default()
        })
        .expect("client construction should not fail")
    }

    #[test]
    fn build_url_joins_endpoint_and_query() {
        let client = test_client("https://services.example.com");
        let url = client
            .build_url(
                "/locations/search",
                &[("limit".to_string(), "100".to_string())],
            )
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://services.example.com/locations/search?limit=100"
        );
    }

    #[test]
    fn build_url_keeps_base_path_prefix() {
        let client = test_client("https://gateway.example.com/crm/");
        let url = client.build_url("locations/search", &[]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://gateway.example.com/crm/locations/search"
        );
    }

    #[test]
    fn build_url_encodes_query_values() {
        let client = test_client("https://services.example.com");
        let url = client
            .build_url(
                "locations/search",
                &[("search".to_string(), "main & 5th".to_string())],
            )
            .expect("url");
        assert!(
            url.as_str().contains("search=main+%26+5th"),
            "query param should be percent-encoded: {url}"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = CrmClient::new(&CrmConfig {
            api_base: "not a url".to_string(),
            ..CrmConfig::default()
        });
        assert!(matches!(
            result,
            Err(ClientBuildError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn agency_scope_falls_back_to_pit() {
        let client = CrmClient::new(&CrmConfig {
            pit_key: Some("pit".to_string()),
            ..CrmConfig::default()
        })
        .expect("client");
        assert_eq!(client.agency_scope(), TokenScope::PrivateIntegration);

        let client = CrmClient::new(&CrmConfig {
            agency_api_key: Some("agency".to_string()),
            pit_key: Some("pit".to_string()),
            ..CrmConfig::default()
        })
        .expect("client");
        assert_eq!(client.agency_scope(), TokenScope::Agency);
    }
}
