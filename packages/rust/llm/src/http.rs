//! Response handling shared by the HTTP providers.

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::LlmError;

/// User-Agent string for provider requests.
pub(crate) const USER_AGENT: &str = concat!("DocModernizer/", env!("CARGO_PKG_VERSION"));

/// Reduce a provider-specific response body to its text content.
pub(crate) trait ExtractText {
    fn extract_text(self) -> Result<String, LlmError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// `{"error": {"message": ...}}`, used by both Anthropic and OpenAI.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

/// Build a client with the shared User-Agent.
pub(crate) fn build_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| LlmError::NotConfigured(format!("failed to build HTTP client: {e}")))
}

/// Send a prepared request and decode the body as `R`, mapping HTTP failures
/// to [`LlmError`].
pub(crate) async fn send<R>(request: RequestBuilder) -> Result<String, LlmError>
where
    R: DeserializeOwned + ExtractText,
{
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return Err(LlmError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    if !(200..300).contains(&status) {
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => parsed.error.message,
            Err(_) => body,
        };
        return Err(LlmError::ApiError { status, message });
    }

    debug!(status, body_len = body.len(), "provider response received");

    let parsed: R = serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;
    parsed.extract_text()
}
