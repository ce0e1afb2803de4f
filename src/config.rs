//! Hub configuration: TOML file plus `HUB_*` environment overrides.
//!
//! Provider secrets have no defaults; a provider without credentials is simply
//! left unconfigured and its endpoints answer with an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Complete hub configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Externally reachable base URL, used to derive OAuth redirect URIs
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Origins allowed by CORS (the integration UI)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_url: default_public_url(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Which KV backend holds state tokens and credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

/// KV store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// TTL applied to both pending OAuth state and stored credentials
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Sweep interval for the in-memory backend
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6380/0".to_string()
}

fn default_ttl_seconds() -> u64 {
    600
}

fn default_cleanup_interval() -> u64 {
    60
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: default_redis_url(),
            ttl_seconds: default_ttl_seconds(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every provider request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Upper bound on concurrent per-record detail fetches
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_detail_concurrency() -> usize {
    4
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            detail_concurrency: default_detail_concurrency(),
        }
    }
}

/// What happens to stored credentials once items have been fetched with them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialPolicy {
    /// Keep until the TTL expires
    #[default]
    Retain,
    /// Delete on read; the user must re-authorize before the next fetch
    Consume,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub airtable: AirtableConfig,
    #[serde(default)]
    pub hubspot: HubSpotConfig,
    #[serde(default)]
    pub notion: NotionConfig,
}

/// Airtable authorizes with a personal access token scoped to one base.
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableConfig {
    pub personal_access_token: Option<String>,
    pub base_id: Option<String>,
    #[serde(default = "default_airtable_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub credential_policy: CredentialPolicy,
}

fn default_airtable_api_base() -> String {
    "https://api.airtable.com".to_string()
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            personal_access_token: None,
            base_id: None,
            api_base: default_airtable_api_base(),
            credential_policy: CredentialPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubSpotConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Defaults to `{public_url}/integrations/hubspot/oauth2callback`
    pub redirect_uri: Option<String>,
    #[serde(default = "default_hubspot_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_hubspot_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_hubspot_token_url")]
    pub token_url: String,
    #[serde(default = "default_hubspot_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub credential_policy: CredentialPolicy,
}

fn default_hubspot_scopes() -> Vec<String> {
    vec![
        "crm.objects.contacts.read".to_string(),
        "crm.objects.companies.read".to_string(),
    ]
}

fn default_hubspot_auth_url() -> String {
    "https://app.hubspot.com/oauth/authorize".to_string()
}

fn default_hubspot_token_url() -> String {
    "https://api.hubapi.com/oauth/v1/token".to_string()
}

fn default_hubspot_api_base() -> String {
    "https://api.hubapi.com".to_string()
}

impl Default for HubSpotConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            scopes: default_hubspot_scopes(),
            auth_url: default_hubspot_auth_url(),
            token_url: default_hubspot_token_url(),
            api_base: default_hubspot_api_base(),
            credential_policy: CredentialPolicy::default(),
        }
    }
}

/// Notion supports a public OAuth integration or an internal integration token.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Defaults to `{public_url}/integrations/notion/oauth2callback`
    pub redirect_uri: Option<String>,
    /// Used when no OAuth client is configured
    pub integration_token: Option<String>,
    #[serde(default = "default_notion_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_notion_token_url")]
    pub token_url: String,
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
    #[serde(default = "default_notion_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub credential_policy: CredentialPolicy,
}

fn default_notion_auth_url() -> String {
    "https://api.notion.com/v1/oauth/authorize".to_string()
}

fn default_notion_token_url() -> String {
    "https://api.notion.com/v1/oauth/token".to_string()
}

fn default_notion_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_api_version() -> String {
    "2022-06-28".to_string()
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            integration_token: None,
            auth_url: default_notion_auth_url(),
            token_url: default_notion_token_url(),
            api_base: default_notion_api_base(),
            api_version: default_notion_api_version(),
            credential_policy: CredentialPolicy::default(),
        }
    }
}

impl HubConfig {
    /// Applies `HUB_*` environment variables on top of the loaded values.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("HUB_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = var("HUB_PUBLIC_URL") {
            self.server.public_url = v;
        }
        if let Some(v) = var("HUB_STORE_BACKEND") {
            match v.to_lowercase().as_str() {
                "memory" => self.store.backend = StoreBackend::Memory,
                "redis" => self.store.backend = StoreBackend::Redis,
                other => tracing::warn!(value = %other, "Ignoring unknown HUB_STORE_BACKEND"),
            }
        }
        if let Some(v) = var("HUB_REDIS_URL") {
            self.store.redis_url = v;
        }
        if let Some(n) = var("HUB_STORE_TTL_SECONDS").and_then(|v| v.parse().ok()) {
            self.store.ttl_seconds = n;
        }
        if let Some(n) = var("HUB_HTTP_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.http.request_timeout_seconds = n;
        }

        let providers = &mut self.providers;
        override_opt(&var, "HUB_AIRTABLE_PAT", &mut providers.airtable.personal_access_token);
        override_opt(&var, "HUB_AIRTABLE_BASE_ID", &mut providers.airtable.base_id);
        override_opt(&var, "HUB_HUBSPOT_CLIENT_ID", &mut providers.hubspot.client_id);
        override_opt(&var, "HUB_HUBSPOT_CLIENT_SECRET", &mut providers.hubspot.client_secret);
        override_opt(&var, "HUB_HUBSPOT_REDIRECT_URI", &mut providers.hubspot.redirect_uri);
        override_opt(&var, "HUB_NOTION_CLIENT_ID", &mut providers.notion.client_id);
        override_opt(&var, "HUB_NOTION_CLIENT_SECRET", &mut providers.notion.client_secret);
        override_opt(&var, "HUB_NOTION_REDIRECT_URI", &mut providers.notion.redirect_uri);
        override_opt(
            &var,
            "HUB_NOTION_INTEGRATION_TOKEN",
            &mut providers.notion.integration_token,
        );
    }

    /// Redirect URI registered with the provider for its OAuth callback.
    pub fn redirect_uri(&self, provider: &str, explicit: Option<&str>) -> String {
        match explicit {
            Some(uri) => uri.to_string(),
            None => format!(
                "{}/integrations/{}/oauth2callback",
                self.server.public_url.trim_end_matches('/'),
                provider
            ),
        }
    }
}

fn override_opt(var: &impl Fn(&str) -> Option<String>, name: &str, target: &mut Option<String>) {
    if let Some(v) = var(name).filter(|v| !v.is_empty()) {
        *target = Some(v);
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<HubConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: HubConfig =
        toml::from_str(&contents).with_context(|| format!("Invalid config file {}", path))?;
    Ok(config)
}
