//! The four LLM-backed pipeline stages.
//!
//! Each stage is an async function returning [`StageResult`]. Stages never
//! substitute defaults themselves; [`crate::pipeline::Pipeline`] owns the
//! degrade-to-default policy.

pub mod analyze;
pub mod generate;
pub mod quality;
pub mod research;

use std::fmt;

use docmodernizer_llm::{LlmError, LlmProvider};
use thiserror::Error;

pub use analyze::analyze_content;
pub use generate::generate_modernized_docs;
pub use quality::check_quality;
pub use research::{prioritize_issues, research_best_practices};

/// Maximum number of issues sent to the researcher.
pub const MAX_RESEARCHED_ISSUES: usize = 5;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A pipeline step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Analyze,
    Research,
    Generate,
    QualityCheck,
}

impl Stage {
    /// Every stage in the order the pipeline runs them.
    pub const ORDER: [Stage; 5] = [
        Stage::Fetch,
        Stage::Analyze,
        Stage::Research,
        Stage::Generate,
        Stage::QualityCheck,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Analyze => "analyze",
            Self::Research => "research",
            Self::Generate => "generate",
            Self::QualityCheck => "quality_check",
        }
    }

    /// Human-readable description for progress output.
    pub fn description(self) -> &'static str {
        match self {
            Self::Fetch => "Fetching documentation",
            Self::Analyze => "Analyzing content",
            Self::Research => "Researching best practices",
            Self::Generate => "Generating modernized documentation",
            Self::QualityCheck => "Performing quality check",
        }
    }

    /// The following stage; `None` after the quality check (done).
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::Fetch => Some(Self::Analyze),
            Self::Analyze => Some(Self::Research),
            Self::Research => Some(Self::Generate),
            Self::Generate => Some(Self::QualityCheck),
            Self::QualityCheck => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// StageFailure
// ---------------------------------------------------------------------------

/// Why an LLM stage produced no usable output.
#[derive(Debug, Error)]
pub enum StageFailure {
    /// The provider for this stage could not be constructed.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The response contained no parseable JSON.
    #[error("no JSON found in model response")]
    NoJson,

    /// JSON was found but had the wrong top-level type.
    #[error("expected a JSON {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

pub type StageResult<T> = std::result::Result<T, StageFailure>;

/// Borrow the stage's provider or fail with [`StageFailure::ProviderUnavailable`].
pub(crate) fn require_provider<'a>(
    provider: Option<&'a dyn LlmProvider>,
    role: &str,
) -> StageResult<&'a dyn LlmProvider> {
    provider.ok_or_else(|| StageFailure::ProviderUnavailable(format!("no {role} provider configured")))
}

/// JSON type name for [`StageFailure::UnexpectedShape`].
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_matches_next() {
        let mut stage = Stage::Fetch;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen, Stage::ORDER);
        assert_eq!(Stage::QualityCheck.to_string(), "quality_check");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn stage_failure_display() {
        let err = StageFailure::UnexpectedShape {
            expected: "array",
            found: "object",
        };
        assert_eq!(err.to_string(), "expected a JSON array, got object");

        let err: StageFailure = LlmError::RequestFailed("timeout".into()).into();
        assert!(err.to_string().contains("timeout"));
    }
}
