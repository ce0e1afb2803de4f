//! Short-lived credential cache for provider tokens.
//!
//! Credentials live in the shared KV store under
//! `{provider}_credentials:{org_id}:{user_id}` with a TTL (600 seconds by
//! default). They are a cache, not permanent storage: once the TTL lapses the
//! user has to authorize again.
//!
//! # Usage
//!
//! ```no_run
//! use integration_hub::credentials::{CredentialStore, Credentials, StaticToken};
//! use integration_hub::kv::MemoryKvStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> integration_hub::Result<()> {
//! let store = CredentialStore::new(Arc::new(MemoryKvStore::new()), Duration::from_secs(600));
//!
//! let creds = Credentials::Static(StaticToken {
//!     token: "pat_123".to_string(),
//!     base_id: Some("appXYZ".to_string()),
//! });
//! store.save("airtable", "org1", "user1", &creds, store.ttl()).await?;
//!
//! if let Some(creds) = store.load("airtable", "org1", "user1").await? {
//!     println!("Token: {}", creds.bearer_token());
//! }
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::{credentials_key, state_key, CredentialStore};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credentials for calling a provider API on behalf of one org/user pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    /// Raw token-exchange response of an OAuth provider
    OAuth(TokenCredentials),
    /// Static token configured for the provider (PAT / integration token)
    Static(StaticToken),
}

impl Credentials {
    /// Token sent as `Authorization: Bearer ...` to the provider API.
    pub fn bearer_token(&self) -> &str {
        match self {
            Credentials::OAuth(tokens) => &tokens.access_token,
            Credentials::Static(token) => &token.token,
        }
    }

    /// True when there is no usable token.
    pub fn is_empty(&self) -> bool {
        self.bearer_token().trim().is_empty()
    }
}

/// OAuth token response, kept verbatim.
///
/// The standard fields are typed; anything else the provider returns
/// (`bot_id`, `workspace_name`, `hub_id`, ...) is preserved in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token configured out-of-band rather than obtained through OAuth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    /// Airtable base the token is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
}
