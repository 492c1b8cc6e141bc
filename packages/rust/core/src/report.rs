//! Markdown rendering of a finished pipeline run.

use docmodernizer_shared::{Issue, PipelineState, QualityReport, Severity};
use serde_json::Value;

use crate::stages::quality::SCORE_CATEGORIES;

/// The four user-facing documents produced from a [`PipelineState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModernizationReport {
    pub original: String,
    pub analysis: String,
    pub modernized: String,
    pub quality: String,
}

impl ModernizationReport {
    pub fn from_state(state: &PipelineState) -> Self {
        Self {
            original: state.original_content.clone(),
            analysis: render_analysis(&state.analyzed_sections),
            modernized: render_modernized(&state.modernized_markdown),
            quality: render_quality(&state.quality_report),
        }
    }
}

/// Issues grouped by severity, highest first.
///
/// Issues with an unrecognized severity are listed with the low group.
pub fn render_analysis(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "No issues identified.".to_string();
    }

    let groups = [
        (Severity::High, "⚠️", "High"),
        (Severity::Medium, "⚡", "Medium"),
        (Severity::Low, "ℹ️", "Low"),
    ];

    let mut out = String::from("## Issues Identified\n\n");
    for (severity, icon, label) in groups {
        let members: Vec<&Issue> = issues
            .iter()
            .filter(|issue| match issue.severity {
                Severity::Unknown => severity == Severity::Low,
                other => other == severity,
            })
            .collect();
        if members.is_empty() {
            continue;
        }

        out.push_str(&format!("### {icon} {label} Severity\n"));
        for issue in members {
            let section = if issue.section.is_empty() {
                "N/A"
            } else {
                issue.section.as_str()
            };
            out.push_str(&format!("- **{section}**: {}\n", issue.description));
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

pub fn render_modernized(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        "No content generated.".to_string()
    } else {
        markdown.to_string()
    }
}

/// Scores for the four categories, the average, and any suggestions.
pub fn render_quality(report: &QualityReport) -> String {
    let mut out = String::from("## Quality Assessment\n\n### Scores\n\n");

    for category in SCORE_CATEGORIES {
        let score = report
            .scores
            .get(category)
            .map(score_text)
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!("- **{}**: {score}/10\n", category_title(category)));
    }

    out.push_str(&format!("\n**Average Score**: {:.1}/10\n", report.average_score));

    if !report.suggestions.is_empty() {
        out.push_str("\n### Suggestions for Improvement\n\n");
        for suggestion in &report.suggestions {
            out.push_str(&format!("- {suggestion}\n"));
        }
    }

    out.trim_end().to_string()
}

fn score_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `technical_accuracy` → `Technical Accuracy`.
fn category_title(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
