//! Researcher: gather current best practices for the most severe issues.

use chrono::{SecondsFormat, Utc};
use docmodernizer_llm::{ChatMessage, LlmProvider};
use docmodernizer_shared::{Issue, ResearchResult};
use tracing::{info, instrument, warn};

use super::{MAX_RESEARCHED_ISSUES, StageResult, require_provider};

/// Sort issues by descending severity rank and keep the top five.
///
/// The sort is stable, so equally ranked issues keep their analyzer order.
pub fn prioritize_issues(issues: &[Issue]) -> Vec<Issue> {
    let mut sorted = issues.to_vec();
    sorted.sort_by_key(|issue| std::cmp::Reverse(issue.severity.rank()));
    sorted.truncate(MAX_RESEARCHED_ISSUES);
    sorted
}

/// Research each prioritized issue with one model call per issue.
///
/// A failed call is logged and that issue is skipped.
#[instrument(skip_all, fields(issues = issues.len()))]
pub async fn research_best_practices(
    provider: Option<&dyn LlmProvider>,
    issues: &[Issue],
) -> StageResult<Vec<ResearchResult>> {
    let provider = require_provider(provider, "review")?;
    let mut results = Vec::new();

    for issue in prioritize_issues(issues) {
        let messages = [ChatMessage::user(research_prompt(&issue))];

        match provider.complete(&messages).await {
            Ok(current_practices) => results.push(ResearchResult {
                original_issue: issue,
                current_practices,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            }),
            Err(e) => {
                warn!(
                    provider = provider.provider_name(),
                    model = provider.model_name(),
                    section = %issue.section,
                    error = %e,
                    "research failed for issue, skipping"
                );
            }
        }
    }

    info!(results = results.len(), "research completed");
    Ok(results)
}

fn research_prompt(issue: &Issue) -> String {
    let section = non_empty_or(&issue.section, "Unknown section");
    let description = non_empty_or(&issue.description, "No description provided");

    format!(
        "Provide current best practices to address the following documentation issue:\n\
         Section: {section}\n\
         Issue: {description}\n\
         Include modern tools/frameworks, recommended approaches, and key references. Keep the answer concise."
    )
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}
