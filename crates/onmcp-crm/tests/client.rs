//! Integration tests for `CrmClient` against a `wiremock` server.
//!
//! Covers the three outcome classes of the response triple (success,
//! rejection, transport failure), credential short-circuits, and the OAuth
//! grants.

use onmcp_core::CrmConfig;
use onmcp_crm::{CrmClient, ListLocationsParams, RequestOptions, TokenScope, TRANSPORT_FAILURE};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> CrmConfig {
    CrmConfig {
        agency_api_key: Some("agency-key".to_string()),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        api_base: server.uri(),
        api_version: "2021-07-28".to_string(),
        request_timeout_secs: 5,
        ..CrmConfig::default()
    }
}

fn test_client(server: &MockServer) -> CrmClient {
    CrmClient::new(&config_for(server)).expect("failed to build test CrmClient")
}

// ---------------------------------------------------------------------------
// request
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_sends_auth_and_version_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/abc"))
        .and(header("authorization", "Bearer tok"))
        .and(header("version", "2021-07-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"location": {"id": "abc"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .request("locations/abc", "tok", RequestOptions::get())
        .await;

    assert_eq!(response.status, 200);
    assert!(response.error.is_none());
    assert_eq!(
        response.data,
        Some(json!({"location": {"id": "abc"}}))
    );
}

#[tokio::test]
async fn request_serializes_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .and(body_string_contains("\"firstName\":\"Ada\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"contact": {"id": "c1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .request(
            "contacts/",
            "tok",
            RequestOptions::with_method(reqwest::Method::POST, Some(json!({"firstName": "Ada"}))),
        )
        .await;

    assert_eq!(response.status, 201);
    assert!(response.is_success());
}

#[tokio::test]
async fn request_non_2xx_extracts_message_and_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Location not found"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .request("locations/missing", "tok", RequestOptions::get())
        .await;

    assert_eq!(response.status, 404);
    assert!(response.data.is_none());
    assert_eq!(response.error.as_deref(), Some("Location not found"));
    assert!(!response.is_transport_failure());
}

#[tokio::test]
async fn request_non_json_error_body_falls_back_to_status_line() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .request("locations/search", "tok", RequestOptions::get())
        .await;

    assert_eq!(response.status, 503);
    assert_eq!(
        response.error.as_deref(),
        Some("Request failed: Service Unavailable")
    );
}

#[tokio::test]
async fn request_malformed_success_body_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .request("locations/search", "tok", RequestOptions::get())
        .await;

    assert_eq!(response.status, TRANSPORT_FAILURE);
    assert!(response.data.is_none());
    assert!(response
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("malformed JSON")));
}

#[tokio::test]
async fn request_unreachable_host_is_status_zero() {
    let client = CrmClient::new(&CrmConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        request_timeout_secs: 2,
        ..CrmConfig::default()
    })
    .expect("client");

    let response = client
        .request("locations/search", "tok", RequestOptions::get())
        .await;

    assert_eq!(response.status, 0);
    assert!(response.data.is_none());
    assert!(response.error.is_some());
}

#[tokio::test]
async fn request_scoped_without_credential_never_hits_the_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = CrmClient::new(&CrmConfig {
        api_base: server.uri(),
        ..CrmConfig::default()
    })
    .expect("client");

    let response = client
        .request_scoped(TokenScope::Agency, None, "locations/search", RequestOptions::get())
        .await;

    assert_eq!(response.status, 0);
    assert_eq!(
        response.error.as_deref(),
        Some("Agency API key not configured")
    );
}

// ---------------------------------------------------------------------------
// list_locations / health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_locations_passes_paging_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/search"))
        .and(query_param("limit", "100"))
        .and(query_param("skip", "200"))
        .and(query_param("companyId", "ag-1"))
        .and(header("authorization", "Bearer agency-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [{"id": "l1"}, {"id": "l2"}],
            "total": 202
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .list_locations(&ListLocationsParams {
            limit: 100,
            skip: 200,
            search: None,
            company_id: Some("ag-1".to_string()),
        })
        .await;

    let page = response.into_result().expect("page");
    assert_eq!(page.locations.len(), 2);
    assert_eq!(page.total, Some(202));
}

#[tokio::test]
async fn list_locations_uses_pit_when_agency_key_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/search"))
        .and(header("authorization", "Bearer pit-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"locations": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CrmClient::new(&CrmConfig {
        pit_key: Some("pit-key".to_string()),
        api_base: server.uri(),
        ..CrmConfig::default()
    })
    .expect("client");

    let response = client
        .list_locations(&ListLocationsParams {
            limit: 100,
            ..ListLocationsParams::default()
        })
        .await;
    assert!(response.is_success());
}

#[tokio::test]
async fn health_reports_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/search"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid JWT"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let health = client.health(None).await;

    assert!(!health.ok);
    assert_eq!(health.status, 401);
    assert_eq!(health.error.as_deref(), Some("Invalid JWT"));
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exchange_code_posts_form_encoded_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 86399,
            "token_type": "Bearer",
            "locationId": "loc-9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let grant = client
        .exchange_code("the-code", None)
        .await
        .into_result()
        .expect("grant");

    assert_eq!(grant.access_token, "at");
    assert_eq!(grant.refresh_token.as_deref(), Some("rt"));
    assert_eq!(grant.location_id.as_deref(), Some("loc-9"));
}

#[tokio::test]
async fn refresh_token_rejection_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client.refresh_token("stale").await;

    assert_eq!(response.status, 400);
    assert_eq!(response.error.as_deref(), Some("invalid_grant"));
}

#[tokio::test]
async fn oauth_without_client_credentials_short_circuits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = CrmClient::new(&CrmConfig {
        api_base: server.uri(),
        ..CrmConfig::default()
    })
    .expect("client");

    let response = client.refresh_token("rt").await;
    assert_eq!(response.status, 0);
    assert_eq!(
        response.error.as_deref(),
        Some("OAuth client credentials not configured")
    );
}
