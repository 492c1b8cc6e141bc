//! Post-conversion cleanup passes and small Markdown utilities.
//!
//! Each pass is a function `&str -> String` applied in sequence by
//! [`run_pipeline`].

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run every cleanup pass on freshly converted Markdown.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = normalize_line_endings(md);

    result = fix_code_block_languages(&result);
    result = strip_leftover_html(&result);
    result = resolve_links(&result, base_url);
    clean_markdown(&result)
}

// ---------------------------------------------------------------------------
// Public utilities
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on each line, collapse runs of blank lines to a
/// single blank line, and trim the whole document.
pub fn clean_markdown(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    if md.is_empty() {
        return String::new();
    }

    let trimmed_lines = md
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    MULTI_BLANK_RE
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// A fenced code block found in Markdown text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info-string language tag; empty when the fence has none.
    pub language: String,
    pub code: String,
}

/// Collect every fenced code block in document order.
pub fn extract_code_blocks(md: &str) -> Vec<CodeBlock> {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```([\w+-]*)[ \t]*\n(.*?)```").expect("valid regex")
    });

    FENCE_RE
        .captures_iter(md)
        .map(|caps| CodeBlock {
            language: caps[1].to_string(),
            code: caps[2].trim().to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

fn normalize_line_endings(md: &str) -> String {
    md.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip class-style prefixes from fence languages (`language-js` → `js`).
fn fix_code_block_languages(md: &str) -> String {
    static LANG_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)(\w+)").expect("valid regex")
    });

    LANG_PREFIX_RE.replace_all(md, "```$1").to_string()
}

/// Remove layout tags that survived conversion, outside code fences only.
fn strip_leftover_html(md: &str) -> String {
    static LAYOUT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|article|aside|main|figure|figcaption|details|summary)(?:\s[^>]*)?>",
        )
        .expect("valid regex")
    });

    let mut in_code_block = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
                return line.to_string();
            }
            if in_code_block {
                line.to_string()
            } else {
                LAYOUT_TAG_RE.replace_all(line, "").to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve relative link targets against the page URL. Images, anchors and
/// absolute URLs are left untouched.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    let Some(base) = base_url else {
        return md.to_string();
    };

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let original = caps[0].to_string();
            let is_image = caps
                .get(0)
                .is_some_and(|m| m.start() > 0 && md.as_bytes()[m.start() - 1] == b'!');
            let href = &caps[2];

            if is_image
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || Url::parse(href).is_ok()
            {
                return original;
            }

            match base.join(href) {
                Ok(resolved) => format!("[{}]({resolved})", &caps[1]),
                Err(_) => original,
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
