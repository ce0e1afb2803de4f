//! Integration registry: the configured providers and how each authorizes.
//!
//! Built once from [`HubConfig`] at startup. Each provider pairs a
//! [`Connector`] with its authorization mode and credential read policy.

use crate::connectors::{AirtableConnector, HubSpotConnector, NotionConnector};
use crate::Connector;
use integration_hub::config::{CredentialPolicy, HubConfig};
use integration_hub::credentials::StaticToken;
use integration_hub::oauth::{CallbackOutcome, OAuthCallback, OAuthFlow, OAuthProviderConfig};
use integration_hub::{CredentialStore, Credentials, IntegrationError, ItemListing, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How users connect a provider.
pub enum Authorization {
    /// Authorization code flow
    OAuth(OAuthFlow),
    /// Token from configuration, written to the store on authorize
    Static(StaticToken),
    /// Missing client credentials or token; the reason is reported to callers
    Unconfigured(String),
}

impl Authorization {
    pub fn mode(&self) -> &'static str {
        match self {
            Authorization::OAuth(_) => "oauth",
            Authorization::Static(_) => "token",
            Authorization::Unconfigured(_) => "unconfigured",
        }
    }
}

/// A registered provider.
pub struct Integration {
    pub connector: Arc<dyn Connector>,
    pub authorization: Authorization,
    pub credential_policy: CredentialPolicy,
}

/// Response to an authorize request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthorizeResponse {
    /// Open this URL to continue on the provider's site
    Redirect { url: String },
    /// Credentials were stored immediately
    Stored { success: bool },
}

/// Entry of the provider listing.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationInfo {
    pub name: String,
    pub authorization: String,
    pub configured: bool,
    pub credential_policy: CredentialPolicy,
}

/// Rejects blank user or org ids.
fn require_identity(user_id: &str, org_id: &str) -> Result<()> {
    if user_id.trim().is_empty() || org_id.trim().is_empty() {
        return Err(IntegrationError::invalid_request(
            "user_id and org_id are required",
        ));
    }
    Ok(())
}

pub struct IntegrationRegistry {
    store: CredentialStore,
    integrations: BTreeMap<String, Integration>,
}

impl IntegrationRegistry {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            integrations: BTreeMap::new(),
        }
    }

    /// Registers Airtable, HubSpot and Notion from configuration.
    ///
    /// All connectors share one HTTP client with the configured timeout.
    pub fn from_config(config: &HubConfig, store: CredentialStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.request_timeout_seconds))
            .user_agent(concat!("integration-hub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let providers = &config.providers;
        let mut registry = Self::new(store.clone());

        let airtable = &providers.airtable;
        let authorization = match (&airtable.personal_access_token, &airtable.base_id) {
            (Some(token), Some(base_id)) if !token.is_empty() && !base_id.is_empty() => {
                Authorization::Static(StaticToken {
                    token: token.clone(),
                    base_id: Some(base_id.clone()),
                })
            }
            _ => Authorization::Unconfigured(
                "airtable requires personal_access_token and base_id".to_string(),
            ),
        };
        registry.register(
            Arc::new(AirtableConnector::new(http.clone(), airtable.api_base.clone())),
            authorization,
            airtable.credential_policy,
        );

        let hubspot = &providers.hubspot;
        let authorization = match OAuthProviderConfig::hubspot(config) {
            Some(oauth) => {
                Authorization::OAuth(OAuthFlow::new("hubspot", oauth, store.clone(), http.clone()))
            }
            None => Authorization::Unconfigured(
                "hubspot requires client_id and client_secret".to_string(),
            ),
        };
        registry.register(
            Arc::new(HubSpotConnector::new(
                http.clone(),
                hubspot.api_base.clone(),
                config.http.detail_concurrency,
            )),
            authorization,
            hubspot.credential_policy,
        );

        let notion = &providers.notion;
        let authorization = match (OAuthProviderConfig::notion(config), &notion.integration_token) {
            (Some(oauth), _) => {
                Authorization::OAuth(OAuthFlow::new("notion", oauth, store.clone(), http.clone()))
            }
            (None, Some(token)) if !token.is_empty() => Authorization::Static(StaticToken {
                token: token.clone(),
                base_id: None,
            }),
            _ => Authorization::Unconfigured(
                "notion requires client_id and client_secret, or integration_token".to_string(),
            ),
        };
        registry.register(
            Arc::new(NotionConnector::new(
                http,
                notion.api_base.clone(),
                notion.api_version.clone(),
            )),
            authorization,
            notion.credential_policy,
        );

        for (name, integration) in &registry.integrations {
            info!(
                provider = %name,
                authorization = integration.authorization.mode(),
                "Integration registered"
            );
        }
        Ok(registry)
    }

    /// Adds or replaces the provider named by `connector`.
    pub fn register(
        &mut self,
        connector: Arc<dyn Connector>,
        authorization: Authorization,
        credential_policy: CredentialPolicy,
    ) {
        self.integrations.insert(
            connector.name().to_string(),
            Integration {
                connector,
                authorization,
                credential_policy,
            },
        );
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn get(&self, provider: &str) -> Result<&Integration> {
        self.integrations
            .get(provider)
            .ok_or_else(|| IntegrationError::NotFound(format!("Unknown integration '{}'", provider)))
    }

    /// Registered providers in name order.
    pub fn list(&self) -> Vec<IntegrationInfo> {
        self.integrations
            .iter()
            .map(|(name, integration)| IntegrationInfo {
                name: name.clone(),
                authorization: integration.authorization.mode().to_string(),
                configured: !matches!(integration.authorization, Authorization::Unconfigured(_)),
                credential_policy: integration.credential_policy,
            })
            .collect()
    }

    /// Starts authorization for a user/org pair.
    ///
    /// OAuth providers return the URL to open; static-token providers store
    /// their credentials right away.
    pub async fn authorize(
        &self,
        provider: &str,
        user_id: &str,
        org_id: &str,
    ) -> Result<AuthorizeResponse> {
        let integration = self.get(provider)?;
        require_identity(user_id, org_id)?;

        match &integration.authorization {
            Authorization::OAuth(flow) => {
                let url = flow.begin_authorization(user_id, org_id).await?;
                Ok(AuthorizeResponse::Redirect { url })
            }
            Authorization::Static(token) => {
                self.store
                    .save(
                        provider,
                        org_id,
                        user_id,
                        &Credentials::Static(token.clone()),
                        self.store.ttl(),
                    )
                    .await?;
                info!(provider = %provider, org_id = %org_id, user_id = %user_id, "Static token stored");
                Ok(AuthorizeResponse::Stored { success: true })
            }
            Authorization::Unconfigured(reason) => {
                Err(IntegrationError::NotConfigured(reason.clone()))
            }
        }
    }

    /// Completes an OAuth authorization.
    pub async fn oauth_callback(
        &self,
        provider: &str,
        callback: &OAuthCallback,
    ) -> Result<CallbackOutcome> {
        match &self.get(provider)?.authorization {
            Authorization::OAuth(flow) => flow.handle_callback(callback).await,
            Authorization::Static(_) => Err(IntegrationError::invalid_request(format!(
                "{} authorizes with a static token and has no OAuth callback",
                provider
            ))),
            Authorization::Unconfigured(reason) => {
                Err(IntegrationError::NotConfigured(reason.clone()))
            }
        }
    }

    /// Reads stored credentials, deleting them under the consume policy.
    async fn read_credentials(
        &self,
        provider: &str,
        integration: &Integration,
        user_id: &str,
        org_id: &str,
    ) -> Result<Option<Credentials>> {
        match integration.credential_policy {
            CredentialPolicy::Retain => self.store.load(provider, org_id, user_id).await,
            CredentialPolicy::Consume => self.store.consume(provider, org_id, user_id).await,
        }
    }

    /// Stored credentials for a user/org pair.
    pub async fn credentials(
        &self,
        provider: &str,
        user_id: &str,
        org_id: &str,
    ) -> Result<Credentials> {
        let integration = self.get(provider)?;
        require_identity(user_id, org_id)?;
        self.read_credentials(provider, integration, user_id, org_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or_else(|| IntegrationError::NotFound("No credentials found.".to_string()))
    }

    /// Fetches items with the stored credentials.
    ///
    /// No stored credentials yields an empty listing.
    pub async fn items(&self, provider: &str, user_id: &str, org_id: &str) -> Result<ItemListing> {
        let integration = self.get(provider)?;
        require_identity(user_id, org_id)?;
        let Some(credentials) = self
            .read_credentials(provider, integration, user_id, org_id)
            .await?
        else {
            debug!(provider = %provider, org_id = %org_id, user_id = %user_id, "No credentials stored");
            return Ok(ItemListing::new());
        };

        let listing = integration.connector.fetch_items(&credentials).await?;
        info!(
            provider = %provider,
            org_id = %org_id,
            user_id = %user_id,
            items = listing.items.len(),
            failures = listing.failures.len(),
            "Items fetched"
        );
        Ok(listing)
    }
}
