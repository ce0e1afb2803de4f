//! Decoding provider responses into data or a recorded upstream failure.

use integration_hub::item::UpstreamFailure;
use integration_hub::Result;
use serde::de::DeserializeOwned;

/// Longest response body kept in a failure message.
const MAX_MESSAGE_LEN: usize = 512;

/// Outcome of one provider call that produced a response.
///
/// The outer `Result` carries transport failures (fatal for the fetch); the
/// inner one separates decoded data from a non-success answer.
pub type Fetched<T> = Result<std::result::Result<T, UpstreamFailure>>;

/// Reads `response` as JSON, or describes why it cannot be used.
///
/// Non-success statuses and undecodable bodies become an [`UpstreamFailure`]
/// tagged with `stage`; errors while reading the body propagate.
pub async fn decode<T: DeserializeOwned>(stage: &str, response: reqwest::Response) -> Fetched<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Ok(Err(failure(stage, status.as_u16(), &body)));
    }

    match serde_json::from_str(&body) {
        Ok(data) => Ok(Ok(data)),
        Err(e) => Ok(Err(failure(
            stage,
            status.as_u16(),
            &format!("invalid response body: {}", e),
        ))),
    }
}

/// Builds a failure with the message truncated to a readable length.
pub fn failure(stage: &str, status: u16, message: &str) -> UpstreamFailure {
    let mut message = message.trim().to_string();
    if message.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push_str("...");
    }
    UpstreamFailure {
        stage: stage.to_string(),
        status,
        message,
    }
}
