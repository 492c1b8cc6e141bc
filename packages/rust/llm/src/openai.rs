//! OpenAI-compatible chat completions provider.
//!
//! Used with Gemini's OpenAI endpoint by default, but any server exposing
//! `POST {base_url}/chat/completions` with Bearer auth works.

use async_trait::async_trait;
use docmodernizer_shared::{ProviderConfig, resolve_api_key};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http::{self, ExtractText};
use crate::{ChatMessage, LlmError, LlmProvider};

/// Chat completions provider.
#[derive(Debug)]
pub struct OpenAiCompatProvider {
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        max_tokens: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_tokens,
            client: http::build_client()?,
        })
    }

    /// Build from a provider config section, reading the key from its env var.
    pub fn from_config(config: &ProviderConfig, max_tokens: u32) -> Result<Self, LlmError> {
        let api_key =
            resolve_api_key(config).map_err(|e| LlmError::NotConfigured(e.to_string()))?;
        Self::new(api_key, &config.model, &config.base_url, max_tokens)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ExtractText for ChatResponse {
    fn extract_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("No message content in response".to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    #[instrument(skip_all, fields(provider = "openai-compat", model = %self.model))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
        };

        let builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request);

        http::send::<ChatResponse>(builder).await
    }

    fn provider_name(&self) -> &'static str {
        "openai-compat"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(server: &wiremock::MockServer) -> OpenAiCompatProvider {
        // Trailing slash mirrors the Gemini default base URL.
        let base = format!("{}/v1beta/openai/", server.uri());
        OpenAiCompatProvider::new("test-key", "gemini-2.0-flash", &base, 512).unwrap()
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1beta/openai/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer test-key"))
            .and(wiremock::matchers::body_partial_json(json!({
                "model": "gemini-2.0-flash",
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "You review docs."},
                    {"role": "user", "content": "Analyze this."}
                ]
            })))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "[]"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = [
            ChatMessage::system("You review docs."),
            ChatMessage::user("Analyze this."),
        ];
        let text = provider(&server).complete(&messages).await.unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn empty_choices_is_parse_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[tokio::test]
    async fn api_error_carries_provider_message() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "API key not valid", "code": 400}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        match err {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(429).insert_header("retry-after", "12"),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::RateLimited {
                retry_after_secs: Some(12)
            }
        ));
    }

    #[test]
    fn reports_provider_and_model() {
        let provider =
            OpenAiCompatProvider::new("k", "gemini-2.0-flash", "http://localhost:1/", 16).unwrap();
        assert_eq!(provider.provider_name(), "openai-compat");
        assert_eq!(provider.model_name(), "gemini-2.0-flash");
    }

    #[test]
    fn from_config_without_key_is_not_configured() {
        let config = ProviderConfig {
            api_key_env: "DM_TEST_MISSING_OPENAI_KEY_98765".into(),
            ..ProviderConfig::analysis()
        };
        let err = OpenAiCompatProvider::from_config(&config, 4096).unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured(_)));
    }
}
