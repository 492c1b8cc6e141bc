//! Fake LLM provider for testing.
//!
//! Returns deterministic responses based on prompt matching so stage and
//! pipeline tests run without network access.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{ChatMessage, LlmError, LlmProvider};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// A fake provider keyed on prompt substrings.
///
/// Patterns are checked in registration order against the concatenated
/// message contents (case-insensitive); the first match wins. Every call is
/// recorded so tests can assert on what was sent.
#[derive(Debug, Default)]
pub struct FakeProvider {
    replies: Vec<(String, Reply)>,
    default_reply: Option<Reply>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    /// A provider with no registered responses; every call fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that returns `response` for prompts containing `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        Self::new().respond(prompt_contains, response)
    }

    /// Add a response for prompts containing a substring.
    pub fn respond(mut self, prompt_contains: &str, response: &str) -> Self {
        self.replies.push((
            prompt_contains.to_lowercase(),
            Reply::Text(response.to_string()),
        ));
        self
    }

    /// Fail with `LlmError::RequestFailed` for prompts containing a substring.
    pub fn fail_on(mut self, prompt_contains: &str, message: &str) -> Self {
        self.replies.push((
            prompt_contains.to_lowercase(),
            Reply::Fail(message.to_string()),
        ));
        self
    }

    /// Response used when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_reply = Some(Reply::Text(response.to_string()));
        self
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Prompts received so far, each the newline-joined message contents.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.clone());

        let prompt_lower = prompt.to_lowercase();
        let reply = self
            .replies
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern.as_str()))
            .map(|(_, reply)| reply)
            .or(self.default_reply.as_ref());

        match reply {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Fail(message)) => Err(LlmError::RequestFailed(message.clone())),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: no response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(text)]
    }

    #[tokio::test]
    async fn matches_case_insensitively() {
        let provider = FakeProvider::with_response("HELLO", "world");
        let result = provider.complete(&ask("hello there")).await.unwrap();
        assert_eq!(result, "world");
    }

    #[tokio::test]
    async fn matches_system_message_content() {
        let provider = FakeProvider::with_response("technical writer", "[]");
        let messages = [
            ChatMessage::system("You are a senior technical writer."),
            ChatMessage::user("Analyze."),
        ];
        assert_eq!(provider.complete(&messages).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn first_registered_pattern_wins() {
        let provider = FakeProvider::new()
            .respond("section: install", "first")
            .respond("section", "second");
        let result = provider
            .complete(&ask("Section: Install\nIssue: old"))
            .await
            .unwrap();
        assert_eq!(result, "first");
    }

    #[tokio::test]
    async fn no_match_without_default_is_error() {
        let provider = FakeProvider::new();
        assert!(provider.complete(&ask("random prompt")).await.is_err());

        let provider = FakeProvider::new().with_default_response("default");
        assert_eq!(provider.complete(&ask("random")).await.unwrap(), "default");
    }

    #[tokio::test]
    async fn fail_on_and_call_recording() {
        let provider = FakeProvider::new()
            .fail_on("boom", "simulated outage")
            .with_default_response("ok");

        let err = provider.complete(&ask("boom")).await.unwrap_err();
        assert!(err.to_string().contains("simulated outage"));
        provider.complete(&ask("fine")).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["boom".to_string(), "fine".to_string()]);
    }
}
