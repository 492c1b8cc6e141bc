//! Anthropic messages API provider.

use async_trait::async_trait;
use docmodernizer_shared::{ProviderConfig, resolve_api_key};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http::{self, ExtractText};
use crate::{ChatMessage, LlmError, LlmProvider, Role};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API provider.
#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        max_tokens: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl ExtractText for MessagesResponse {
    fn extract_text(self) -> Result<String, LlmError> {
        let texts: Vec<String> = self
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if texts.is_empty() {
            return Err(LlmError::ParseError("No text content in response".to_string()));
        }
        Ok(texts.concat())
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    #[instrument(skip_all, fields(provider = "anthropic", model = %self.model))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        // System prompts go in the top-level field, not the message list.
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: messages.iter().filter(|m| m.role != Role::System).collect(),
        };

        let builder = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);

        http::send::<MessagesResponse>(builder).await
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
