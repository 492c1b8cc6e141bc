//! Best-effort JSON extraction from free-form model output.
//!
//! Models wrap JSON in code fences, prefix it with prose, or append trailing
//! commentary. [`extract_json`] tries a fixed list of candidate substrings and
//! returns the first that parses strictly.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"));

/// Strictly parse `text` as JSON. Returns `None` on any syntax error.
pub fn safe_json_parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Extract a JSON object or array from a model response.
///
/// Candidates, in order:
/// 1. the body of each fenced code block (optionally tagged `json`) that
///    starts with `{` or `[`
/// 2. the span from the leftmost `{` or `[` to the last matching closer
/// 3. every balanced `{...}` / `[...]` span, left to right
///
/// Returns `None` (and logs a warning) when no candidate parses.
pub fn extract_json(response: &str) -> Option<Value> {
    if response.trim().is_empty() {
        return None;
    }

    let fenced = FENCE_RE
        .captures_iter(response)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| body.starts_with('{') || body.starts_with('['));

    let found = fenced
        .chain(greedy_span(response))
        .chain(balanced_spans(response))
        .find_map(safe_json_parse);

    if found.is_none() {
        warn!(response_len = response.len(), "failed to extract JSON from response");
    }
    found
}

/// Leftmost opener through the last occurrence of its closer.
fn greedy_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// Every bracket-balanced span, scanning openers left to right. Brackets
/// inside JSON string literals are ignored.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .filter_map(move |(start, _)| balanced_end(&text[start..]).map(|len| &text[start..start + len]))
}

/// Byte length of the balanced span starting at the first char of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}
