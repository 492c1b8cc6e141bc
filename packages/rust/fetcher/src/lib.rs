//! Documentation page fetching.
//!
//! Validates the input URL, downloads the page with a single GET and hands the
//! HTML to [`docmodernizer_markdown::html_to_markdown`].

use std::sync::LazyLock;
use std::time::Duration;

use docmodernizer_shared::{ModernizerError, Result};
use regex::Regex;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

/// Default timeout in seconds for the page request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("DocModernizer/", env!("CARGO_PKG_VERSION"));

/// Accepted URL shape: http(s) scheme and a dotted host.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[\w.-]+(?:\.[\w.-]+)+.*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Options / result
// ---------------------------------------------------------------------------

/// Configuration for a page fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for the HTTP request in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A downloaded page and its Markdown conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub raw_html: String,
    pub markdown: String,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Check that `url` is a non-empty http(s) URL with a dotted host.
pub fn validate_url(url: &str) -> Result<Url> {
    if url.is_empty() {
        return Err(ModernizerError::validation("URL must be a non-empty string"));
    }
    if !URL_RE.is_match(url) {
        return Err(ModernizerError::validation(format!("Invalid URL: {url}")));
    }

    Url::parse(url).map_err(|e| ModernizerError::validation(format!("Invalid URL: {url} ({e})")))
}

/// Fetch a documentation page and convert it to Markdown.
///
/// Validation happens before any network activity. Non-2xx responses are
/// network errors. No retries.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_documentation(url: &str, opts: &FetchOptions) -> Result<FetchedDocument> {
    let parsed = validate_url(url)?;
    let client = build_client(opts)?;

    info!("fetching documentation page");

    let response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| ModernizerError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ModernizerError::Network(format!("{url}: HTTP {status}")));
    }

    let raw_html = response
        .text()
        .await
        .map_err(|e| ModernizerError::Network(format!("{url}: failed to read body: {e}")))?;

    let markdown = docmodernizer_markdown::html_to_markdown(&raw_html, Some(&parsed))?;

    info!(
        html_len = raw_html.len(),
        markdown_len = markdown.len(),
        "documentation fetched"
    );

    Ok(FetchedDocument { raw_html, markdown })
}

fn build_client(opts: &FetchOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| ModernizerError::Network(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Guide</title></head><body>
        <nav><a href="/">Home</a></nav>
        <main>
            <h1>Getting Started</h1>
            <p>Install with <code>pip install example</code>.</p>
        </main>
        <footer>Copyright</footer>
    </body></html>"#;

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://docs.python.org/3/tutorial/").is_ok());
        assert!(validate_url("http://example.com").is_ok());
    }

    #[test]
    fn validate_url_rejects_bad_input() {
        let err = validate_url("").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("non-empty"));

        for bad in ["not-a-url", "ftp://example.com", "https://localhost", "example.com"] {
            let err = validate_url(bad).unwrap_err();
            assert!(err.is_validation(), "{bad} should be rejected");
            assert!(err.to_string().contains("Invalid URL"));
        }
    }

    #[tokio::test]
    async fn fetch_converts_main_content() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/docs/start"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        // The mock server listens on 127.0.0.1, which satisfies the dotted-host rule.
        let url = format!("{}/docs/start", server.uri());
        let doc = fetch_documentation(&url, &FetchOptions::default())
            .await
            .unwrap();

        assert!(doc.raw_html.contains("<main>"));
        assert!(doc.markdown.contains("# Getting Started"));
        assert!(doc.markdown.contains("pip install example"));
        assert!(!doc.markdown.contains("Copyright"));
        assert!(!doc.markdown.contains("Home"));
    }

    #[tokio::test]
    async fn fetch_non_success_is_network_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let err = fetch_documentation(&url, &FetchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ModernizerError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn invalid_url_makes_no_request() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetch_documentation("not-a-url", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        server.verify().await;
    }
}
