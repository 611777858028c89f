//! OAuth2 authorization-code and refresh-token grants.

use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::client::{read_response, CrmClient};
use crate::error::CredentialError;
use crate::response::CrmResponse;

const TOKEN_ENDPOINT: &str = "oauth/token";

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(rename = "locationId", default)]
    pub location_id: Option<String>,
    #[serde(rename = "companyId", default)]
    pub company_id: Option<String>,
    #[serde(rename = "userType", default)]
    pub user_type: Option<String>,
}

impl CrmClient {
    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> CrmResponse<TokenGrant> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_owned()),
            ("code", code.to_owned()),
        ];
        if let Some(uri) = redirect_uri {
            form.push(("redirect_uri", uri.to_owned()));
        }
        self.token_grant(form).await
    }

    /// Trade a refresh token for a fresh access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> CrmResponse<TokenGrant> {
        let form = vec![
            ("grant_type", "refresh_token".to_owned()),
            ("refresh_token", refresh_token.to_owned()),
        ];
        self.token_grant(form).await
    }

    async fn token_grant(&self, mut form: Vec<(&'static str, String)>) -> CrmResponse<TokenGrant> {
        let (Some(client_id), Some(client_secret)) = (
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) else {
            return CrmResponse::transport(CredentialError::OAuthClientMissing.to_string());
        };
        form.push(("client_id", client_id.to_owned()));
        form.push(("client_secret", client_secret.to_owned()));

        let url = match self.build_url(TOKEN_ENDPOINT, &[]) {
            Ok(url) => url,
            Err(message) => return CrmResponse::transport(message),
        };

        let response = match self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "OAuth token request failed");
                return CrmResponse::transport(e.to_string());
            }
        };

        read_response(response).await.and_then(|body| {
            serde_json::from_value::<TokenGrant>(body)
                .map_err(|e| format!("unexpected token response: {e}"))
        })
    }
}
