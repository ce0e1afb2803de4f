//! OAuth token exchange logic.
//!
//! Handles exchanging authorization codes for access tokens.

use super::provider::{ClientAuth, OAuthProviderConfig};
use crate::credentials::TokenCredentials;
use crate::error::{IntegrationError, Result};
use serde::Serialize;

/// Token request body for providers authenticating the client with Basic auth
#[derive(Serialize)]
struct JsonTokenRequest<'a> {
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Exchange authorization code for access token
///
/// Sends a single POST to the provider's token endpoint. The client
/// authenticates as the provider expects (see [`ClientAuth`]).
///
/// # Returns
/// * `Ok(TokenCredentials)` - The token response, verbatim
/// * `Err(TokenExchangeFailed)` - Non-success status; status and body kept
/// * `Err(Http | Timeout)` - Transport failure
pub async fn exchange_code_for_token(
    client: &reqwest::Client,
    provider: &OAuthProviderConfig,
    code: &str,
) -> Result<TokenCredentials> {
    tracing::debug!("Exchanging authorization code for token at {}", provider.token_url);

    let request = client
        .post(&provider.token_url)
        .header("Accept", "application/json");

    let request = match provider.client_auth {
        ClientAuth::BasicJson => request
            .basic_auth(&provider.client_id, Some(&provider.client_secret))
            .json(&JsonTokenRequest {
                grant_type: "authorization_code",
                code,
                redirect_uri: &provider.redirect_uri,
            }),
        ClientAuth::FormBody => request.form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ]),
    };

    let response = request.send().await?;

    // Check response status
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(IntegrationError::TokenExchangeFailed { status, body });
    }

    let body = response.text().await?;
    let tokens: TokenCredentials = serde_json::from_str(&body)?;

    tracing::debug!(
        "Token exchange successful, has_refresh_token={}, expires_in={:?}",
        tokens.refresh_token.is_some(),
        tokens.expires_in
    );

    Ok(tokens)
}
