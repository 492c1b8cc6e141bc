//! HTML-to-Markdown conversion for fetched documentation pages.
//!
//! Strips page chrome, picks the main content region, converts it with `htmd`
//! (ATX headings), and runs the cleanup passes in [`cleanup`].

mod cleanup;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use docmodernizer_shared::{ModernizerError, Result};

pub use cleanup::{CodeBlock, clean_markdown, extract_code_blocks};

/// Elements removed from the document before the content region is chosen.
const CHROME_TAGS: &str = "script, style, nav, header, footer";

/// Content regions, tried in priority order.
const CONTENT_SELECTORS: [&str; 4] = ["main", "article", ".content", ".documentation"];

static CHROME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(CHROME_TAGS).expect("valid selector"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static TR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert a full HTML page to Markdown.
///
/// 1. Removes `script`, `style`, `nav`, `header` and `footer` elements
/// 2. Selects `main`, `article`, `.content`, `.documentation`, else `body`
/// 3. Renders HTML tables as Markdown tables
/// 4. Converts with `htmd` using ATX headings
/// 5. Normalizes line endings and runs the cleanup passes
///
/// `source_url`, when given, is used to resolve relative links.
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn html_to_markdown(html: &str, source_url: Option<&Url>) -> Result<String> {
    let mut doc = Html::parse_document(html);
    remove_chrome(&mut doc);

    let region = select_content_region(&doc);
    let (region, tables) = extract_tables(&region);

    let converter = htmd::HtmlToMarkdown::builder()
        .options(htmd::options::Options {
            heading_style: htmd::options::HeadingStyle::Atx,
            ..Default::default()
        })
        .skip_tags(vec!["script", "style", "nav", "header", "footer", "noscript"])
        .build();

    let raw_markdown = converter
        .convert(&region)
        .map_err(|e| ModernizerError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), tables = tables.len(), "htmd conversion complete");

    let raw_markdown = splice_tables(raw_markdown, &tables);
    let markdown = cleanup::run_pipeline(&raw_markdown, source_url);
    debug!(final_len = markdown.len(), "markdown cleanup complete");

    Ok(markdown)
}

/// Detach every chrome element from the parsed tree.
fn remove_chrome(doc: &mut Html) {
    let ids: Vec<_> = doc.select(&CHROME_SEL).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Outer HTML of the first matching content region.
fn select_content_region(doc: &Html) -> String {
    for sel_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            debug!(selector = sel_str, "content region selected");
            return el.html();
        }
    }

    match doc.select(&BODY_SEL).next() {
        Some(body) => body.html(),
        None => doc.root_element().html(),
    }
}

// ---------------------------------------------------------------------------
// Table pre-processing
// ---------------------------------------------------------------------------

/// Placeholder paragraph text standing in for table `n` during conversion.
fn table_token(n: usize) -> String {
    format!("DOCMODERNIZERTABLE{n}")
}

/// Swap each `<table>` for a placeholder paragraph and render it separately.
///
/// `htmd` 0.1 does not convert tables, and it collapses the newlines of any
/// table text left in the HTML, so the rendered tables are spliced back in
/// after conversion by [`splice_tables`].
fn extract_tables(html: &str) -> (String, Vec<String>) {
    let fragment = Html::parse_fragment(html);
    let mut result = html.to_string();
    let mut tables = Vec::new();

    for table in fragment.select(&TABLE_SEL) {
        let token = format!("<p>{}</p>", table_token(tables.len()));
        let outer = table.html();
        if !result.contains(&outer) {
            continue;
        }
        result = result.replacen(&outer, &token, 1);
        tables.push(table_to_markdown(&table));
    }

    (result, tables)
}

fn splice_tables(mut markdown: String, tables: &[String]) -> String {
    // Reverse order keeps `...TABLE1` from matching inside `...TABLE10`.
    for (n, table) in tables.iter().enumerate().rev() {
        markdown = markdown.replacen(&table_token(n), table, 1);
    }
    markdown
}

/// Render one table element; the first row is always used as the header.
fn table_to_markdown(table: &ElementRef) -> String {
    let mut rows: Vec<Vec<String>> = table
        .select(&TR_SEL)
        .map(|tr| {
            tr.select(&CELL_SEL)
                .map(|cell| cell.text().collect::<String>().trim().replace('|', "\\|"))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }
    for row in &mut rows {
        row.resize(width, String::new());
    }

    let line = |cells: &[String]| format!("| {} |", cells.join(" | "));
    let mut lines = vec![line(&rows[0]), line(&vec!["---".to_string(); width])];
    lines.extend(rows[1..].iter().map(|row| line(row)));
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
