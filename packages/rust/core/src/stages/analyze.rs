//! Analyzer: identify modernization issues in the original content.

use docmodernizer_llm::{ChatMessage, LlmProvider, extract_json};
use docmodernizer_shared::Issue;
use serde_json::Value;
use tracing::{info, instrument};

use super::{StageFailure, StageResult, json_kind, require_provider, truncate_chars};

/// Characters of original content sent to the analyzer.
const MAX_CONTENT_CHARS: usize = 8000;

const SYSTEM_PROMPT: &str =
    "You are a senior technical writer and software architect. Identify modernization issues.";

/// Ask the analysis model for a list of issues in `content`.
///
/// Array elements that are not JSON objects are skipped.
#[instrument(skip_all, fields(content_len = content.len()))]
pub async fn analyze_content(
    provider: Option<&dyn LlmProvider>,
    content: &str,
) -> StageResult<Vec<Issue>> {
    let provider = require_provider(provider, "analysis")?;

    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(analysis_prompt(truncate_chars(content, MAX_CONTENT_CHARS))),
    ];

    let response = provider.complete(&messages).await?;
    let parsed = extract_json(&response).ok_or(StageFailure::NoJson)?;

    let Value::Array(items) = parsed else {
        return Err(StageFailure::UnexpectedShape {
            expected: "array",
            found: json_kind(&parsed),
        });
    };

    let issues: Vec<Issue> = items.iter().filter_map(Issue::from_json).collect();
    info!(issues = issues.len(), "analysis completed");
    Ok(issues)
}

fn analysis_prompt(content: &str) -> String {
    format!(
        "Analyze the following technical documentation for modernization issues.\n\
         Identify outdated information, missing best practices, unclear structure, and technical debt.\n\
         Return JSON in the format:\n\
         [{{\"section\": str, \"issue_type\": str, \"description\": str, \"severity\": \"high|medium|low\"}}]\n\n\
         CONTENT:\n{content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodernizer_llm::FakeProvider;
    use docmodernizer_shared::Severity;

    #[tokio::test]
    async fn parses_issue_array() {
        let provider = FakeProvider::with_response(
            "modernization issues",
            r#"```json
[
  {"section": "Installation", "issue_type": "outdated", "description": "Uses easy_install", "severity": "high"},
  "not an object",
  {"section": "Usage", "severity": "LOW"}
]
```"#,
        );

        let issues = analyze_content(Some(&provider), "# Docs\n\nRun easy_install.")
            .await
            .unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].section, "Installation");
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].severity, Severity::Low);
        assert_eq!(issues[1].description, "");
    }

    #[tokio::test]
    async fn sends_system_prompt_and_truncated_content() {
        let provider = FakeProvider::new().with_default_response("[]");
        let content = "x".repeat(MAX_CONTENT_CHARS + 500);

        analyze_content(Some(&provider), &content).await.unwrap();

        let prompt = &provider.prompts()[0];
        assert!(prompt.starts_with("You are a senior technical writer"));
        assert!(prompt.contains(&"x".repeat(MAX_CONTENT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_CONTENT_CHARS + 1)));
    }

    #[tokio::test]
    async fn object_response_is_unexpected_shape() {
        let provider = FakeProvider::new().with_default_response(r#"{"issues": []}"#);
        let err = analyze_content(Some(&provider), "docs").await.unwrap_err();
        assert!(matches!(
            err,
            StageFailure::UnexpectedShape {
                expected: "array",
                found: "object"
            }
        ));
    }

    #[tokio::test]
    async fn prose_response_is_no_json() {
        let provider = FakeProvider::new().with_default_response("Looks fine to me.");
        let err = analyze_content(Some(&provider), "docs").await.unwrap_err();
        assert!(matches!(err, StageFailure::NoJson));
    }

    #[tokio::test]
    async fn missing_provider_fails() {
        let err = analyze_content(None, "docs").await.unwrap_err();
        assert!(matches!(err, StageFailure::ProviderUnavailable(_)));
    }
}
