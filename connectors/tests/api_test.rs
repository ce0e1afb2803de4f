// Integration tests for the integration HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hub_connectors::api::{create_router, UPSTREAM_FAILURES_HEADER};
use hub_connectors::IntegrationRegistry;
use integration_hub::config::HubConfig;
use integration_hub::kv::MemoryKvStore;
use integration_hub::CredentialStore;
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config(mock_url: &str) -> HubConfig {
    let mut config = HubConfig::default();
    let providers = &mut config.providers;

    providers.airtable.personal_access_token = Some("pat_test".to_string());
    providers.airtable.base_id = Some("appBASE".to_string());
    providers.airtable.api_base = mock_url.to_string();

    providers.hubspot.client_id = Some("hs_client".to_string());
    providers.hubspot.client_secret = Some("hs_secret".to_string());
    providers.hubspot.token_url = format!("{}/oauth/v1/token", mock_url);
    providers.hubspot.api_base = mock_url.to_string();

    config
}

fn create_test_app(config: &HubConfig) -> Router {
    let store = CredentialStore::new(Arc::new(MemoryKvStore::new()), Duration::from_secs(600));
    let registry = IntegrationRegistry::from_config(config, store).unwrap();
    create_router(Arc::new(registry))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

/// Upstream that accepts connections and never answers.
async fn silent_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// Extracts the encoded `state` parameter from an authorization URL.
fn state_param(url: &str) -> String {
    let (_, query) = url.split_once('?').unwrap();
    let params: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
    params
        .into_iter()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v)
        .unwrap()
}

#[tokio::test]
async fn test_list_integrations() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let (status, _, body) = get(&app, "/integrations").await;
    assert_eq!(status, StatusCode::OK);

    let json = json(&body);
    let integrations = json["integrations"].as_array().unwrap();
    assert_eq!(integrations.len(), 3);
    assert_eq!(integrations[0]["name"], "airtable");
    assert_eq!(integrations[0]["authorization"], "token");
    assert_eq!(integrations[1]["authorization"], "oauth");
    assert_eq!(integrations[2]["name"], "notion");
    assert_eq!(integrations[2]["configured"], false);
    assert_eq!(integrations[2]["credential_policy"], "retain");
}

#[tokio::test]
async fn test_unknown_provider_is_404() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let (status, _, body) = get(&app, "/integrations/salesforce/authorize?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().unwrap().contains("salesforce"));
}

#[tokio::test]
async fn test_missing_identity_is_400() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let (status, _, body) = get(&app, "/integrations/airtable/items?user_id=u1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("org_id"));
}

#[tokio::test]
async fn test_unconfigured_provider_is_500() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let (status, _, body) = get(&app, "/integrations/notion/authorize?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("notion"));
}

#[tokio::test]
async fn test_airtable_token_flow_and_items() {
    let mut server = Server::new_async().await;
    let _tables = server
        .mock("GET", "/v0/meta/bases/appBASE/tables")
        .match_header("authorization", "Bearer pat_test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"tables": [{"id": "tblA", "name": "Tasks"}]}"#)
        .create_async()
        .await;
    let _records = server
        .mock("GET", "/v0/appBASE/tblA?pageSize=100")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"records": [{"id": "rec1", "fields": {"Name": "Write report"}}]}"#)
        .create_async()
        .await;
    let app = create_test_app(&test_config(&server.url()));

    // No credentials yet: credentials 404, items empty
    let (status, _, _) = get(&app, "/integrations/airtable/credentials?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, body) = get(&app, "/integrations/airtable/items?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));

    let (status, _, body) = get(&app, "/integrations/airtable/authorize?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({"success": true}));

    let (status, _, body) = get(&app, "/integrations/airtable/credentials?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["token"], "pat_test");
    assert_eq!(json(&body)["base_id"], "appBASE");

    let (status, headers, body) = get(&app, "/integrations/airtable/items?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(UPSTREAM_FAILURES_HEADER).is_none());
    let items = json(&body);
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["id"], "rec1");
    assert_eq!(items[0]["name"], "Write report");
    assert_eq!(items[0]["type"], "record");
    assert_eq!(items[0]["parent_name"], "Tasks");
}

#[tokio::test]
async fn test_items_report_upstream_failures() {
    let mut server = Server::new_async().await;
    let _tables = server
        .mock("GET", "/v0/meta/bases/appBASE/tables")
        .with_status(401)
        .with_body(r#"{"error": {"type": "AUTHENTICATION_REQUIRED"}}"#)
        .create_async()
        .await;
    let app = create_test_app(&test_config(&server.url()));

    get(&app, "/integrations/airtable/authorize?user_id=u1&org_id=o1").await;
    let (status, headers, body) = get(&app, "/integrations/airtable/items?user_id=u1&org_id=o1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));
    assert_eq!(headers.get(UPSTREAM_FAILURES_HEADER).unwrap(), "1");
}

#[tokio::test]
async fn test_authorize_accepts_form_and_json_bodies() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/authorize")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("user_id=u1&org_id=o1"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["url"]
        .as_str()
        .unwrap()
        .starts_with("https://app.hubspot.com/oauth/authorize?"));

    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/authorize")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"user_id": "u2", "org_id": "o2"}"#))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["url"].as_str().unwrap().contains("state="));

    let request = Request::builder()
        .method("POST")
        .uri("/integrations/hubspot/authorize")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hubspot_oauth_flow() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/oauth/v1/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "auth_code_123".into()),
            Matcher::UrlEncoded("client_id".into(), "hs_client".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"access_token": "hs_access", "refresh_token": "hs_refresh",
                "expires_in": 1800, "token_type": "bearer"}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let app = create_test_app(&test_config(&server.url()));

    let (status, _, body) = get(&app, "/integrations/hubspot/authorize?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    let state = state_param(json(&body)["url"].as_str().unwrap());

    let callback = format!(
        "/integrations/hubspot/oauth2callback?code=auth_code_123&state={}",
        urlencoding_encode(&state)
    );
    let (status, headers, body) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("window.close()"));

    let (status, _, body) = get(&app, "/integrations/hubspot/credentials?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["access_token"], "hs_access");
    assert_eq!(json(&body)["expires_in"], 1800);

    // The state was consumed; replaying the callback is rejected
    let (status, _, body) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("State does not match"));

    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_unresponsive_provider_is_504() {
    let upstream = silent_upstream().await;
    let mut config = test_config(&upstream);
    config.http.request_timeout_seconds = 1;
    let app = create_test_app(&config);

    // Item fetch against a provider API that never answers
    let (status, _, _) = get(&app, "/integrations/airtable/authorize?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = get(&app, "/integrations/airtable/items?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json(&body)["error"].as_str().is_some());

    // Token exchange against a token endpoint that never answers
    let (_, _, body) = get(&app, "/integrations/hubspot/authorize?user_id=u1&org_id=o1").await;
    let state = state_param(json(&body)["url"].as_str().unwrap());
    let callback = format!(
        "/integrations/hubspot/oauth2callback?code=auth_code_123&state={}",
        urlencoding_encode(&state)
    );
    let (status, _, _) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

    let (status, _, _) = get(&app, "/integrations/hubspot/credentials?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_with_mismatched_state_stores_nothing() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    get(&app, "/integrations/hubspot/authorize?user_id=u1&org_id=o1").await;

    // Well-formed state for the same identity, but not the one issued
    let forged = integration_hub::oauth::OAuthState::generate("u1", "o1")
        .encode()
        .unwrap();
    let (status, _, _) = get(
        &app,
        &format!("/integrations/hubspot/oauth2callback?code=c&state={}", forged),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = get(&app, "/integrations/hubspot/credentials?user_id=u1&org_id=o1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_provider_error_is_400() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let (status, _, body) = get(
        &app,
        "/integrations/hubspot/oauth2callback?error=access_denied&error_description=User+cancelled",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("User cancelled"));
}

#[tokio::test]
async fn test_static_provider_has_no_callback() {
    let app = create_test_app(&test_config("http://127.0.0.1:9"));

    let (status, _, _) = get(&app, "/integrations/airtable/oauth2callback?code=c&state=s").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn urlencoding_encode(value: &str) -> String {
    serde_urlencoded::to_string([("v", value)])
        .unwrap()
        .trim_start_matches("v=")
        .to_string()
}
