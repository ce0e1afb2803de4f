//! OAuth provider configurations.
//!
//! Defines the OAuth 2.0 endpoints and client authentication style of each
//! supported provider. Client credentials come from [`HubConfig`]; a provider
//! without a client id and secret has no OAuth configuration.

use crate::config::HubConfig;
use serde::{Deserialize, Serialize};

/// How the client authenticates at the token endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuth {
    /// `Authorization: Basic base64(client_id:client_secret)`, JSON body
    BasicJson,
    /// `client_id` and `client_secret` in a form-encoded body
    FormBody,
}

/// OAuth provider configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth authorization endpoint URL
    pub auth_url: String,

    /// OAuth token exchange endpoint URL
    pub token_url: String,

    /// Required OAuth scopes (may be empty)
    pub scopes: Vec<String>,

    pub client_id: String,

    pub client_secret: String,

    /// Callback URL registered with the provider
    pub redirect_uri: String,

    pub client_auth: ClientAuth,

    /// Provider-specific authorization parameters (e.g. Notion's `owner=user`)
    #[serde(default)]
    pub extra_params: Vec<(String, String)>,
}

impl OAuthProviderConfig {
    /// Build authorization URL with the encoded state attached
    pub fn build_auth_url(&self, state: &str) -> String {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
        );
        if !self.scopes.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(&self.scopes.join(" ")));
        }
        for (key, value) in &self.extra_params {
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
        url.push_str("&state=");
        url.push_str(&urlencoding::encode(state));
        url
    }

    /// HubSpot: client credentials in the form body.
    pub fn hubspot(config: &HubConfig) -> Option<Self> {
        let hubspot = &config.providers.hubspot;
        let client_id = hubspot.client_id.clone().filter(|s| !s.is_empty())?;
        let client_secret = hubspot.client_secret.clone().filter(|s| !s.is_empty())?;

        Some(Self {
            auth_url: hubspot.auth_url.clone(),
            token_url: hubspot.token_url.clone(),
            scopes: hubspot.scopes.clone(),
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri("hubspot", hubspot.redirect_uri.as_deref()),
            client_auth: ClientAuth::FormBody,
            extra_params: Vec::new(),
        })
    }

    /// Notion: Basic auth with a JSON body; no scopes.
    pub fn notion(config: &HubConfig) -> Option<Self> {
        let notion = &config.providers.notion;
        let client_id = notion.client_id.clone().filter(|s| !s.is_empty())?;
        let client_secret = notion.client_secret.clone().filter(|s| !s.is_empty())?;

        Some(Self {
            auth_url: notion.auth_url.clone(),
            token_url: notion.token_url.clone(),
            scopes: Vec::new(),
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri("notion", notion.redirect_uri.as_deref()),
            client_auth: ClientAuth::BasicJson,
            extra_params: vec![("owner".to_string(), "user".to_string())],
        })
    }
}
