//! OAuth state tokens for CSRF protection.
//!
//! The state sent to the provider is the base64url-encoded JSON of
//! [`OAuthState`]. The same record is stored server-side under the
//! identity's state key; the callback is accepted only when the echoed
//! `state` equals the stored one exactly.

use crate::error::{IntegrationError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Bytes of entropy in a state token.
pub const STATE_TOKEN_BYTES: usize = 32;

/// Pending authorization for one org/user pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    /// Random token, base64url without padding
    pub state: String,
    pub user_id: String,
    pub org_id: String,
}

impl OAuthState {
    /// Generates a fresh random state for this identity.
    pub fn generate(user_id: &str, org_id: &str) -> Self {
        let mut bytes = [0u8; STATE_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        Self {
            state: URL_SAFE_NO_PAD.encode(bytes),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        }
    }

    /// Encodes the state for the `state` query parameter.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes a `state` query parameter. Padded input is accepted.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim().trim_end_matches('='))
            .map_err(|e| IntegrationError::invalid_request(format!("Malformed state: {}", e)))?;

        let state: OAuthState = serde_json::from_slice(&bytes)
            .map_err(|e| IntegrationError::invalid_request(format!("Malformed state: {}", e)))?;

        if state.state.is_empty() || state.user_id.is_empty() || state.org_id.is_empty() {
            return Err(IntegrationError::invalid_request(
                "Malformed state: missing state, user_id or org_id",
            ));
        }

        Ok(state)
    }

    /// Exact comparison of the random token.
    pub fn matches(&self, stored: &OAuthState) -> bool {
        self.state == stored.state
    }
}
