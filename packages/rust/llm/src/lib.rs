//! LLM provider abstraction for the modernization stages.
//!
//! Two HTTP providers are supported: an OpenAI-compatible chat completions
//! endpoint (used with Gemini) and the Anthropic messages API. Both reduce a
//! response to plain text through [`http::ExtractText`]. [`FakeProvider`]
//! answers deterministically for tests.

mod anthropic;
mod fake;
mod http;
pub mod json;
mod openai;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use fake::FakeProvider;
pub use json::{extract_json, safe_json_parse};
pub use openai::OpenAiCompatProvider;

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A chat model that turns a message list into a text reply.
///
/// Implementations hold their own HTTP client and credentials and are safe to
/// share across tasks.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send the messages and return the model's text response.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Provider name (e.g. "anthropic", "openai-compat", "fake").
    fn provider_name(&self) -> &'static str;

    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;
}
