//! Error taxonomy shared by the credential store, OAuth flow and connectors.

use thiserror::Error;

/// Errors raised while authorizing against or reading from an integration.
///
/// Every variant carries enough context to be rendered as a structured
/// HTTP error; see [`IntegrationError::status_code`].
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// Missing or malformed input from the caller.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Callback state did not match the pending state for this identity.
    #[error("State does not match")]
    StateMismatch,

    /// The provider reported an error (e.g. `error=access_denied` on callback).
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Token endpoint answered with a non-success status.
    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    /// The shared KV store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A paginated listing stopped making forward progress.
    #[error("Pagination error: {0}")]
    PaginationError(String),

    /// No credentials stored for the requested identity, or unknown provider.
    #[error("{0}")]
    NotFound(String),

    /// The provider has no client credentials or token configured.
    #[error("Integration not configured: {0}")]
    NotConfigured(String),

    /// Outbound request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Outbound request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A stored or received JSON document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntegrationError {
    /// HTTP status the API layer responds with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            IntegrationError::InvalidRequest(_)
            | IntegrationError::StateMismatch
            | IntegrationError::ProviderError(_) => 400,
            IntegrationError::NotFound(_) => 404,
            IntegrationError::TokenExchangeFailed { .. }
            | IntegrationError::PaginationError(_)
            | IntegrationError::Http(_) => 502,
            IntegrationError::Timeout(_) => 504,
            IntegrationError::StoreUnavailable(_)
            | IntegrationError::NotConfigured(_)
            | IntegrationError::Serialization(_) => 500,
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        IntegrationError::InvalidRequest(msg.into())
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        IntegrationError::StoreUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IntegrationError::Timeout(err.to_string())
        } else {
            IntegrationError::Http(err.to_string())
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IntegrationError>;
