//! Pipeline data model: the shared state record and its sub-entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline invocation (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordinal issue priority reported by the analyzer.
///
/// Parsed case-insensitively; anything other than high/medium/low becomes
/// [`Severity::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Severity {
    /// Sort rank used when prioritizing issues for research.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a severity label. Never fails.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Issue / ResearchResult / QualityReport
// ---------------------------------------------------------------------------

/// One modernization issue identified by the analyzer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
}

impl Issue {
    /// Build an issue from a loosely-shaped JSON value returned by a model.
    ///
    /// Returns `None` when the value is not an object. Missing or non-string
    /// fields fall back to empty strings / [`Severity::Unknown`].
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(Self {
            section: text("section"),
            issue_type: text("issue_type"),
            description: text("description"),
            severity: Severity::parse(&text("severity")),
        })
    }
}

/// Best-practice research for a single prioritized issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub original_issue: Issue,
    /// Free-text answer from the model.
    pub current_practices: String,
    /// ISO 8601 UTC timestamp (e.g. `2026-10-17T09:30:00.123456Z`).
    pub timestamp: String,
}

/// Scores and suggestions produced by the quality checker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityReport {
    /// Category name → score. Values are expected to be numbers 0-10 but are
    /// kept verbatim so non-numeric answers remain visible.
    #[serde(default)]
    pub scores: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub average_score: f64,
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// The record threaded through every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub run_id: RunId,
    pub url: String,
    pub raw_html: String,
    pub original_content: String,
    pub analyzed_sections: Vec<Issue>,
    pub research_results: Vec<ResearchResult>,
    pub modernized_markdown: String,
    pub quality_report: QualityReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineState {
    /// Fresh state for one invocation, every other field at its zero value.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            url: url.into(),
            raw_html: String::new(),
            original_content: String::new(),
            analyzed_sections: Vec::new(),
            research_results: Vec::new(),
            modernized_markdown: String::new(),
            quality_report: QualityReport::default(),
            error: None,
        }
    }

    /// Merge a stage's partial update. Fields absent from the update are left
    /// unchanged.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            raw_html,
            original_content,
            analyzed_sections,
            research_results,
            modernized_markdown,
            quality_report,
            error,
        } = update;

        if let Some(v) = raw_html {
            self.raw_html = v;
        }
        if let Some(v) = original_content {
            self.original_content = v;
        }
        if let Some(v) = analyzed_sections {
            self.analyzed_sections = v;
        }
        if let Some(v) = research_results {
            self.research_results = v;
        }
        if let Some(v) = modernized_markdown {
            self.modernized_markdown = v;
        }
        if let Some(v) = quality_report {
            self.quality_report = v;
        }
        if let Some(v) = error {
            self.error = Some(v);
        }
    }
}

/// Partial update returned by a stage; `None` means "not touched".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub raw_html: Option<String>,
    pub original_content: Option<String>,
    pub analyzed_sections: Option<Vec<Issue>>,
    pub research_results: Option<Vec<ResearchResult>>,
    pub modernized_markdown: Option<String>,
    pub quality_report: Option<QualityReport>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!(Severity::parse("HIGH"), Severity::High);
        assert_eq!(Severity::parse(" Medium "), Severity::Medium);
        assert_eq!(Severity::parse("low"), Severity::Low);
        assert_eq!(Severity::parse("critical"), Severity::Unknown);
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert_eq!(Severity::Unknown.rank(), 0);
    }

    #[test]
    fn issue_deserializes_with_missing_fields() {
        let issue: Issue =
            serde_json::from_str(r#"{"section": "Install", "severity": "High"}"#).unwrap();
        assert_eq!(issue.section, "Install");
        assert_eq!(issue.description, "");
        assert_eq!(issue.severity, Severity::High);

        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains(r#""severity":"high""#));
    }

    #[test]
    fn issue_from_loose_json() {
        let value = json!({"section": "Setup", "description": 42, "severity": null});
        let issue = Issue::from_json(&value).unwrap();
        assert_eq!(issue.section, "Setup");
        assert_eq!(issue.description, "");
        assert_eq!(issue.severity, Severity::Unknown);

        assert!(Issue::from_json(&json!("just a string")).is_none());
    }

    #[test]
    fn new_state_has_zero_values() {
        let state = PipelineState::new("https://docs.example.com/guide");
        assert_eq!(state.url, "https://docs.example.com/guide");
        assert!(state.original_content.is_empty());
        assert!(state.analyzed_sections.is_empty());
        assert_eq!(state.quality_report, QualityReport::default());
        assert!(state.error.is_none());
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut state = PipelineState::new("https://docs.example.com");
        state.apply(StateUpdate {
            raw_html: Some("<html></html>".into()),
            original_content: Some("# Docs".into()),
            ..Default::default()
        });
        state.apply(StateUpdate {
            modernized_markdown: Some("# Modern Docs".into()),
            ..Default::default()
        });

        assert_eq!(state.raw_html, "<html></html>");
        assert_eq!(state.original_content, "# Docs");
        assert_eq!(state.modernized_markdown, "# Modern Docs");
        assert!(state.error.is_none());
    }

    #[test]
    fn state_serializes_without_error_field_when_unset() {
        let state = PipelineState::new("https://docs.example.com");
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("\"error\""));
        let parsed: PipelineState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
