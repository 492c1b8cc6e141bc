//! Quality checker: score the modernized document against the original.

use docmodernizer_llm::{ChatMessage, LlmProvider, extract_json};
use docmodernizer_shared::QualityReport;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{StageFailure, StageResult, json_kind, require_provider, truncate_chars};

/// Characters of each document sent to the reviewer.
const MAX_SNIPPET_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = "You are a meticulous technical documentation reviewer.";

/// Score categories requested from the reviewer, in report order.
pub const SCORE_CATEGORIES: [&str; 4] = [
    "completeness",
    "clarity",
    "technical_accuracy",
    "modernization_effectiveness",
];

/// Ask the review model for category scores and suggestions.
#[instrument(skip_all)]
pub async fn check_quality(
    provider: Option<&dyn LlmProvider>,
    original: &str,
    modernized: &str,
) -> StageResult<QualityReport> {
    let provider = require_provider(provider, "review")?;

    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(quality_prompt(
            truncate_chars(original, MAX_SNIPPET_CHARS),
            truncate_chars(modernized, MAX_SNIPPET_CHARS),
        )),
    ];

    let response = provider.complete(&messages).await?;
    let parsed = extract_json(&response).ok_or(StageFailure::NoJson)?;

    let Value::Object(mut obj) = parsed else {
        return Err(StageFailure::UnexpectedShape {
            expected: "object",
            found: json_kind(&parsed),
        });
    };

    let scores = match obj.remove("scores") {
        Some(Value::Object(scores)) => scores,
        _ => Map::new(),
    };
    let suggestions = match obj.remove("suggestions") {
        Some(Value::Array(items)) => items.into_iter().map(suggestion_text).collect(),
        _ => Vec::new(),
    };
    let average_score = average_score(&scores);

    info!(average_score, suggestions = suggestions.len(), "quality check completed");

    Ok(QualityReport {
        scores,
        suggestions,
        average_score,
    })
}

/// Mean of the numeric score values rounded to one decimal; 0.0 if none.
pub fn average_score(scores: &Map<String, Value>) -> f64 {
    let values: Vec<f64> = scores.values().filter_map(Value::as_f64).collect();
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (mean * 10.0).round() / 10.0
}

fn suggestion_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn quality_prompt(original: &str, modernized: &str) -> String {
    format!(
        "Compare the original and modernized documentation snippets.\n\
         Score each category 0-10 and provide suggestions.\n\
         Return JSON: {{\"scores\": {{\"completeness\": int, \"clarity\": int, \
         \"technical_accuracy\": int, \"modernization_effectiveness\": int}}, \
         \"suggestions\": [\"...\"]}}\n\n\
         Original:\n{original}\n\nModernized:\n{modernized}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodernizer_llm::FakeProvider;
    use serde_json::json;

    fn scores(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn average_ignores_non_numeric_scores() {
        let s = scores(json!({"completeness": 8, "clarity": 6, "technical_accuracy": "n/a", "modernization_effectiveness": 10}));
        assert_eq!(average_score(&s), 8.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let s = scores(json!({"a": 7, "b": 8, "c": 8}));
        assert_eq!(average_score(&s), 7.7);
        assert_eq!(average_score(&Map::new()), 0.0);
        assert_eq!(average_score(&scores(json!({"a": "high"}))), 0.0);
    }

    #[tokio::test]
    async fn builds_report_from_response() {
        let provider = FakeProvider::with_response(
            "score each category",
            r#"Here is my review:
```json
{"scores": {"completeness": 8, "clarity": 9, "technical_accuracy": 7, "modernization_effectiveness": 8},
 "suggestions": ["Add a migration guide", {"detail": "link API docs"}]}
```"#,
        );

        let report = check_quality(Some(&provider), "# Old", "# New").await.unwrap();

        assert_eq!(report.scores.len(), 4);
        assert_eq!(report.average_score, 8.0);
        assert_eq!(report.suggestions[0], "Add a migration guide");
        assert_eq!(report.suggestions[1], r#"{"detail":"link API docs"}"#);
    }

    #[tokio::test]
    async fn non_object_scores_count_as_empty() {
        let provider = FakeProvider::new()
            .with_default_response(r#"{"scores": [8, 9], "suggestions": "none"}"#);
        let report = check_quality(Some(&provider), "a", "b").await.unwrap();
        assert!(report.scores.is_empty());
        assert!(report.suggestions.is_empty());
        assert_eq!(report.average_score, 0.0);
    }

    #[tokio::test]
    async fn array_response_is_unexpected_shape() {
        let provider = FakeProvider::new().with_default_response("[1, 2]");
        let err = check_quality(Some(&provider), "a", "b").await.unwrap_err();
        assert!(matches!(err, StageFailure::UnexpectedShape { expected: "object", .. }));
    }

    #[tokio::test]
    async fn snippets_are_truncated() {
        let provider = FakeProvider::new().with_default_response("{}");
        let original = "o".repeat(MAX_SNIPPET_CHARS * 2);
        let modernized = "m".repeat(MAX_SNIPPET_CHARS * 2);

        check_quality(Some(&provider), &original, &modernized)
            .await
            .unwrap();

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains(&format!("Original:\n{}\n\n", "o".repeat(MAX_SNIPPET_CHARS))));
        assert!(prompt.ends_with(&format!("Modernized:\n{}", "m".repeat(MAX_SNIPPET_CHARS))));
    }
}
