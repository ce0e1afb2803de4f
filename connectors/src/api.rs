//! Integration HTTP API.
//!
//! Routes, per registered provider:
//! - `GET|POST /integrations/:provider/authorize`: start authorization
//! - `GET /integrations/:provider/oauth2callback`: complete OAuth, closes the window
//! - `GET /integrations/:provider/credentials`: stored credentials
//! - `GET /integrations/:provider/items`: normalized items
//!
//! and `GET /integrations` listing the providers.

use crate::registry::{AuthorizeResponse, IntegrationInfo, IntegrationRegistry};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use integration_hub::config::ServerConfig;
use integration_hub::oauth::OAuthCallback;
use integration_hub::{Credentials, IntegrationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

/// Header carrying the number of upstream calls that failed during an item fetch.
pub const UPSTREAM_FAILURES_HEADER: &str = "x-upstream-failures";

/// Page returned to the authorization popup once the callback succeeded.
const CLOSE_WINDOW_HTML: &str = r#"<html>
    <script>
        window.close();
    </script>
</html>"#;

/// User/org pair, from a query string or request body.
#[derive(Debug, Default, Deserialize)]
pub struct Identity {
    pub user_id: Option<String>,
    pub org_id: Option<String>,
}

impl Identity {
    fn require(&self) -> Result<(&str, &str), IntegrationError> {
        match (self.user_id.as_deref(), self.org_id.as_deref()) {
            (Some(user_id), Some(org_id))
                if !user_id.trim().is_empty() && !org_id.trim().is_empty() =>
            {
                Ok((user_id, org_id))
            }
            _ => Err(IntegrationError::invalid_request(
                "user_id and org_id are required",
            )),
        }
    }
}

#[derive(Serialize)]
struct IntegrationsResponse {
    integrations: Vec<IntegrationInfo>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ---------------------------------------------------------------------------
// HTTP handlers
// ---------------------------------------------------------------------------

async fn list_integrations(
    State(registry): State<Arc<IntegrationRegistry>>,
) -> Json<IntegrationsResponse> {
    Json(IntegrationsResponse {
        integrations: registry.list(),
    })
}

async fn authorize_query(
    State(registry): State<Arc<IntegrationRegistry>>,
    Path(provider): Path<String>,
    Query(identity): Query<Identity>,
) -> Result<Json<AuthorizeResponse>, AppError> {
    let (user_id, org_id) = identity.require()?;
    Ok(Json(registry.authorize(&provider, user_id, org_id).await?))
}

/// Accepts the identity as JSON or as a URL-encoded form.
async fn authorize_body(
    State(registry): State<Arc<IntegrationRegistry>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuthorizeResponse>, AppError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let identity: Identity = if is_json {
        serde_json::from_slice(&body)
            .map_err(|e| IntegrationError::invalid_request(format!("Invalid JSON body: {}", e)))?
    } else {
        serde_urlencoded::from_bytes(&body)
            .map_err(|e| IntegrationError::invalid_request(format!("Invalid form body: {}", e)))?
    };

    let (user_id, org_id) = identity.require()?;
    Ok(Json(registry.authorize(&provider, user_id, org_id).await?))
}

async fn oauth2callback(
    State(registry): State<Arc<IntegrationRegistry>>,
    Path(provider): Path<String>,
    Query(callback): Query<OAuthCallback>,
) -> Result<Html<&'static str>, AppError> {
    let outcome = registry.oauth_callback(&provider, &callback).await?;
    info!(
        provider = %outcome.provider,
        org_id = %outcome.org_id,
        user_id = %outcome.user_id,
        "Integration connected"
    );
    Ok(Html(CLOSE_WINDOW_HTML))
}

async fn get_credentials(
    State(registry): State<Arc<IntegrationRegistry>>,
    Path(provider): Path<String>,
    Query(identity): Query<Identity>,
) -> Result<Json<Credentials>, AppError> {
    let (user_id, org_id) = identity.require()?;
    Ok(Json(registry.credentials(&provider, user_id, org_id).await?))
}

async fn get_items(
    State(registry): State<Arc<IntegrationRegistry>>,
    Path(provider): Path<String>,
    Query(identity): Query<Identity>,
) -> Result<Response, AppError> {
    let (user_id, org_id) = identity.require()?;
    let listing = registry.items(&provider, user_id, org_id).await?;

    let failures = listing.failures.len();
    let mut response = Json(listing.items).into_response();
    if failures > 0 {
        response.headers_mut().insert(
            HeaderName::from_static(UPSTREAM_FAILURES_HEADER),
            HeaderValue::from(failures),
        );
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Renders an [`IntegrationError`] as `{"error": message}` with its status.
pub struct AppError(IntegrationError);

impl From<IntegrationError> for AppError {
    fn from(e: IntegrationError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn create_router(registry: Arc<IntegrationRegistry>) -> Router {
    Router::new()
        .route("/integrations", get(list_integrations))
        .route(
            "/integrations/:provider/authorize",
            get(authorize_query).post(authorize_body),
        )
        .route("/integrations/:provider/oauth2callback", get(oauth2callback))
        .route("/integrations/:provider/credentials", get(get_credentials))
        .route("/integrations/:provider/items", get(get_items))
        .with_state(registry)
}

/// CORS for the integration UI.
///
/// An empty origin list or `*` allows any origin.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .collect();
    let allow_origin = if origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
