//! Credential and OAuth state persistence on top of a [`KvStore`].

use super::Credentials;
use crate::error::Result;
use crate::kv::KvStore;
use crate::oauth::OAuthState;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Key holding credentials for one provider/org/user.
pub fn credentials_key(provider: &str, org_id: &str, user_id: &str) -> String {
    format!("{}_credentials:{}:{}", provider, org_id, user_id)
}

/// Key holding the pending OAuth state for one provider/org/user.
pub fn state_key(provider: &str, org_id: &str, user_id: &str) -> String {
    format!("{}_state:{}:{}", provider, org_id, user_id)
}

/// JSON-encoded credentials and pending OAuth state, stored with a TTL.
///
/// Each value is addressed by a single key; there are no cross-key
/// transactions. Concurrent writes for the same identity are last-write-wins.
#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl CredentialStore {
    /// Creates a store over `kv`; `ttl` is the default lifetime of entries.
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Default TTL for credentials and pending state.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores credentials, replacing any previous value and refreshing the TTL.
    pub async fn save(
        &self,
        provider: &str,
        org_id: &str,
        user_id: &str,
        credentials: &Credentials,
        ttl: Duration,
    ) -> Result<()> {
        let value = serde_json::to_string(credentials)?;
        self.kv
            .set(&credentials_key(provider, org_id, user_id), &value, Some(ttl))
            .await?;
        debug!(provider = %provider, org_id = %org_id, user_id = %user_id, "Credentials stored");
        Ok(())
    }

    /// Returns stored credentials, or `None` when unset or expired.
    pub async fn load(
        &self,
        provider: &str,
        org_id: &str,
        user_id: &str,
    ) -> Result<Option<Credentials>> {
        let key = credentials_key(provider, org_id, user_id);
        match self.kv.get(&key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// Loads and deletes credentials atomically, so they can be read only once.
    pub async fn consume(
        &self,
        provider: &str,
        org_id: &str,
        user_id: &str,
    ) -> Result<Option<Credentials>> {
        let key = credentials_key(provider, org_id, user_id);
        let Some(value) = self.kv.take(&key).await? else {
            return Ok(None);
        };
        debug!(provider = %provider, org_id = %org_id, user_id = %user_id, "Credentials consumed");
        Ok(Some(serde_json::from_str(&value)?))
    }

    /// Deletes stored credentials. Returns whether any were present.
    pub async fn delete(&self, provider: &str, org_id: &str, user_id: &str) -> Result<bool> {
        self.kv
            .delete(&credentials_key(provider, org_id, user_id))
            .await
    }

    /// Records the pending OAuth state for this identity.
    pub async fn save_state(&self, provider: &str, state: &OAuthState, ttl: Duration) -> Result<()> {
        let value = serde_json::to_string(state)?;
        self.kv
            .set(
                &state_key(provider, &state.org_id, &state.user_id),
                &value,
                Some(ttl),
            )
            .await
    }

    /// Returns the pending OAuth state, or `None` when unset or expired.
    pub async fn load_state(
        &self,
        provider: &str,
        org_id: &str,
        user_id: &str,
    ) -> Result<Option<OAuthState>> {
        match self.kv.get(&state_key(provider, org_id, user_id)).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// Removes the pending state if it is exactly `state`.
    ///
    /// Atomic: of several callers presenting the same state, one claims it.
    pub async fn claim_state(&self, provider: &str, state: &OAuthState) -> Result<bool> {
        let expected = serde_json::to_string(state)?;
        self.kv
            .remove_if_value(&state_key(provider, &state.org_id, &state.user_id), &expected)
            .await
    }
}
