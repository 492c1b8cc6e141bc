//! Generator: rewrite the documentation using the analysis and research.

use docmodernizer_llm::{ChatMessage, LlmProvider};
use docmodernizer_shared::{Issue, ResearchResult};
use tracing::{info, instrument};

use super::{StageResult, require_provider, truncate_chars};

/// Characters of original content sent to the generator.
const MAX_CONTENT_CHARS: usize = 12000;

const SYSTEM_PROMPT: &str = "You are an expert technical writer producing clean, modern markdown.";

/// Produce the modernized Markdown document.
#[instrument(skip_all, fields(issues = issues.len(), research = research.len()))]
pub async fn generate_modernized_docs(
    provider: Option<&dyn LlmProvider>,
    original: &str,
    issues: &[Issue],
    research: &[ResearchResult],
) -> StageResult<String> {
    let provider = require_provider(provider, "analysis")?;

    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(generation_prompt(original, issues, research)),
    ];

    let response = provider.complete(&messages).await?;
    let markdown = strip_markdown_fence(&response);

    info!(markdown_len = markdown.len(), "modernized documentation generated");
    Ok(markdown)
}

fn generation_prompt(original: &str, issues: &[Issue], research: &[ResearchResult]) -> String {
    let analysis_lines: Vec<String> = issues
        .iter()
        .map(|issue| {
            format!(
                "- [{}] {}: {}",
                issue.severity,
                or_unknown(&issue.section),
                issue.description
            )
        })
        .collect();

    let research_lines: Vec<String> = research
        .iter()
        .map(|item| {
            format!(
                "- {}: {}",
                or_unknown(&item.original_issue.section),
                item.current_practices
            )
        })
        .collect();

    format!(
        "Rewrite the documentation using modern best practices.\n\
         Requirements:\n\
         - Use clear markdown with proper headings and lists.\n\
         - Update outdated info and include modern tools/frameworks.\n\
         - Provide improved structure and concise explanations.\n\
         - Include code examples where helpful.\n\
         - Add a 'Last Updated' section.\n\
         - Include cross-references where relevant.\n\n\
         Original Documentation (truncated):\n{original}\n\n\
         Issues Identified:\n{analysis}\n\n\
         Research Findings:\n{research}",
        original = truncate_chars(original, MAX_CONTENT_CHARS),
        analysis = analysis_lines.join("\n"),
        research = research_lines.join("\n"),
    )
}

fn or_unknown(section: &str) -> &str {
    if section.trim().is_empty() { "Unknown" } else { section }
}

/// Trim the response and drop a wrapping code fence.
///
/// The opening fence (with an optional `markdown` tag) is removed whenever
/// the reply starts with one. The closing fence is optional: replies cut off
/// at the token limit end without it.
pub fn strip_markdown_fence(response: &str) -> String {
    let trimmed = response.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("markdown").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}
