//! OAuth 2.0 authorization code flow for provider connections.
//!
//! Implements the authorization code flow:
//! 1. Client calls `authorize` for a user/org pair
//! 2. A random state is stored under `{provider}_state:{org}:{user}` and the
//!    provider's authorization URL is returned with the encoded state attached
//! 3. User authorizes on the provider's site
//! 4. Provider redirects to `oauth2callback` with `code` and `state`
//! 5. The stored state is claimed (compared and deleted atomically), the code
//!    is exchanged for tokens and credentials are stored with a TTL
//!
//! Flow stages: not started → pending (state stored) → exchanged
//! (credentials stored). A state is accepted by at most one callback.

mod exchange;
mod provider;
mod state;

pub use exchange::exchange_code_for_token;
pub use provider::{ClientAuth, OAuthProviderConfig};
pub use state::{OAuthState, STATE_TOKEN_BYTES};

use crate::credentials::{CredentialStore, Credentials};
use crate::error::{IntegrationError, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// OAuth callback query parameters
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Identity whose authorization completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub provider: String,
    pub org_id: String,
    pub user_id: String,
}

/// Authorization flow controller for one OAuth provider.
#[derive(Clone)]
pub struct OAuthFlow {
    provider: String,
    config: OAuthProviderConfig,
    store: CredentialStore,
    http: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(
        provider: impl Into<String>,
        config: OAuthProviderConfig,
        store: CredentialStore,
        http: reqwest::Client,
    ) -> Self {
        Self {
            provider: provider.into(),
            config,
            store,
            http,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn config(&self) -> &OAuthProviderConfig {
        &self.config
    }

    /// Starts an authorization and returns the provider URL to open.
    ///
    /// A newer call for the same identity replaces the pending state, so
    /// only the most recent URL can complete.
    pub async fn begin_authorization(&self, user_id: &str, org_id: &str) -> Result<String> {
        if user_id.trim().is_empty() || org_id.trim().is_empty() {
            return Err(IntegrationError::invalid_request(
                "user_id and org_id are required",
            ));
        }

        let state = OAuthState::generate(user_id, org_id);
        let encoded = state.encode()?;

        self.store
            .save_state(&self.provider, &state, self.store.ttl())
            .await?;

        info!(
            provider = %self.provider,
            org_id = %org_id,
            user_id = %user_id,
            "Authorization started"
        );

        Ok(self.config.build_auth_url(&encoded))
    }

    /// Validates the callback, exchanges the code and stores credentials.
    ///
    /// # Security
    /// - The echoed state must equal the stored state exactly
    /// - State is removed atomically before the exchange, so concurrent
    ///   callbacks with the same state see at most one success
    /// - A failed exchange restores the state; nothing is stored
    pub async fn handle_callback(&self, callback: &OAuthCallback) -> Result<CallbackOutcome> {
        // Check for OAuth errors
        if let Some(error) = &callback.error {
            let description = callback
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            warn!(
                provider = %self.provider,
                error = %error,
                description = %description,
                "OAuth authorization failed"
            );
            return Err(IntegrationError::ProviderError(description));
        }

        let code = callback
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| IntegrationError::invalid_request("Missing 'code' parameter"))?;
        let encoded_state = callback
            .state
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IntegrationError::invalid_request("Missing 'state' parameter"))?;

        let received = OAuthState::decode(encoded_state)?;
        let (org_id, user_id) = (received.org_id.as_str(), received.user_id.as_str());

        debug!(provider = %self.provider, org_id = %org_id, user_id = %user_id, "Validating CSRF state");

        // Compare-and-delete: a concurrent replay of this state fails here
        if !self.store.claim_state(&self.provider, &received).await? {
            warn!(
                provider = %self.provider,
                org_id = %org_id,
                user_id = %user_id,
                "OAuth state mismatch (possible CSRF attack)"
            );
            return Err(IntegrationError::StateMismatch);
        }

        let tokens = match exchange_code_for_token(&self.http, &self.config, code).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(provider = %self.provider, error = %e, "Token exchange failed");
                // Pending again, so the authorization can be retried
                if let Err(restore) = self
                    .store
                    .save_state(&self.provider, &received, self.store.ttl())
                    .await
                {
                    warn!(provider = %self.provider, error = %restore, "Failed to restore OAuth state");
                }
                return Err(e);
            }
        };
        let has_refresh_token = tokens.refresh_token.is_some();

        self.store
            .save(
                &self.provider,
                org_id,
                user_id,
                &Credentials::OAuth(tokens),
                self.store.ttl(),
            )
            .await?;

        info!(
            provider = %self.provider,
            org_id = %org_id,
            user_id = %user_id,
            has_refresh_token = has_refresh_token,
            "OAuth flow completed successfully"
        );

        Ok(CallbackOutcome {
            provider: self.provider.clone(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
        })
    }
}
