//! Article text extraction.
//!
//! Turns an article URL into a clean, length-bounded text body:
//!
//! 1. **Denylist**: known boilerplate-only URLs short-circuit with a fixed note
//! 2. **Fetch**: rotated browser identity, elevated retry budget
//! 3. **Clean**: scripts, styles, navigation, headers, footers, asides and forms
//!    are detached from the tree before any text is read
//! 4. **Locate**: the [`heuristics`] chain picks the article text
//! 5. **Sanity check**: when only the broad body/line fallbacks matched,
//!    suspiciously short results are replaced by the raw page text if that is
//!    substantial
//! 6. **Truncate** to the configured character cap
//!
//! Content-level failures are returned as [`ExtractError::Fetch`], whose display
//! form starts with [`EXTRACTION_FAILED_PREFIX`] so it can be stored wherever a
//! body would go and still be recognized as a failure later.

pub mod dom;
pub mod heuristics;

use crate::config::{DenyRule, ExtractConfig, FetchConfig};
use crate::fetch::{BrowserIdentity, FetchError, HttpGet, PageFetch, RetryFetch};
use crate::models::EXTRACTION_FAILED_PREFIX;
use scraper::Html;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Failures while extracting article text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page could not be retrieved.
    #[error("{}: {}", EXTRACTION_FAILED_PREFIX, .0)]
    Fetch(FetchError),

    /// Our own request setup is broken (bad configured header, HTTP client).
    #[error("extractor setup failed: {0}")]
    Setup(FetchError),
}

impl From<FetchError> for ExtractError {
    fn from(err: FetchError) -> Self {
        if err.is_remote() {
            Self::Fetch(err)
        } else {
            Self::Setup(err)
        }
    }
}

impl ExtractError {
    /// Whether this is an ordinary "the site didn't give us an article" outcome
    /// rather than a defect in our setup.
    pub fn is_content_failure(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Anything that can turn an article URL into article text.
///
/// The enrichment loop only depends on this trait, so tests can count calls
/// and script results without a network.
pub trait ContentSource {
    async fn extract(&self, url: &str) -> Result<String, ExtractError>;
}

/// Fetches article pages and runs the extraction heuristics over them.
#[derive(Debug)]
pub struct Extractor<F = RetryFetch<HttpGet>> {
    fetcher: F,
    identity: BrowserIdentity,
    config: ExtractConfig,
}

impl Extractor<RetryFetch<HttpGet>> {
    /// Build an extractor over a real HTTP client.
    pub fn new(fetch: &FetchConfig, config: ExtractConfig) -> Result<Self, FetchError> {
        let http = HttpGet::new(fetch.timeout())?;
        let fetcher = RetryFetch::new(http, config.retry);
        Ok(Self::with_fetcher(fetcher, BrowserIdentity::new(fetch), config))
    }
}

impl<F> Extractor<F>
where
    F: PageFetch,
{
    pub fn with_fetcher(fetcher: F, identity: BrowserIdentity, config: ExtractConfig) -> Self {
        Self {
            fetcher,
            identity,
            config,
        }
    }

    fn denied(&self, url: &str) -> Option<&DenyRule> {
        self.config
            .denylist
            .iter()
            .find(|rule| url.contains(&rule.url_contains))
    }
}

impl<F> ContentSource for Extractor<F>
where
    F: PageFetch,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<String, ExtractError> {
        if let Some(rule) = self.denied(url) {
            info!(pattern = %rule.url_contains, "URL is denylisted; skipping fetch");
            return Ok(rule.note.clone());
        }

        let headers = self.identity.rotated()?;
        let page = self.fetcher.get(url, &headers).await?;
        debug!(status = page.status, final_url = %page.url, "Extracting from fetched page");
        Ok(extract_article_text(&page.url, &page.body, &self.config))
    }
}

/// Extract article text from already-fetched markup.
///
/// Never fails; an unusable page yields whatever little text it has (possibly
/// empty) and the caller's quality gate decides what to do with it.
pub fn extract_article_text(url: &str, markup: &str, config: &ExtractConfig) -> String {
    let mut document = Html::parse_document(markup);
    let removed = dom::strip_elements(&mut document, &config.strip_tags);
    debug!(removed, "Stripped non-content elements");

    let parsed = Url::parse(url).ok();
    let ctx = heuristics::Context {
        config,
        host: parsed.as_ref().and_then(|u| u.host_str()),
    };

    let text = match heuristics::first_match(&document, &ctx) {
        Some(found) if !found.checked => {
            debug!(strategy = found.strategy, chars = found.text.chars().count(), "Heuristic matched");
            return dom::truncate_chars(&found.text, config.max_chars);
        }
        Some(found) => {
            debug!(strategy = found.strategy, chars = found.text.chars().count(), "Fallback heuristic matched");
            found.text
        }
        None => String::new(),
    };

    if is_suspect(&text, config) {
        warn!(chars = text.chars().count(), "Extracted content is suspiciously short");
        let raw = dom::page_text(&document);
        if raw.chars().count() > config.raw_fallback_min_chars {
            return dom::truncate_chars(&raw, config.max_chars);
        }
    }

    dom::truncate_chars(&text, config.max_chars)
}

fn is_suspect(text: &str, config: &ExtractConfig) -> bool {
    text.chars().count() < config.suspect_min_chars || dom::word_count(text) < config.suspect_min_words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchConfig, RetryPolicy};

    const LONG: &str = "This sentence is long enough to count as a real paragraph of article text.";

    fn article_html(paragraphs: usize) -> String {
        let body: String = (0..paragraphs).map(|i| format!("<p>{i} {LONG}</p>")).collect();
        format!(
            r#"<!DOCTYPE html><html><head><title>T</title><script>var x = "tracking";</script></head>
            <body>
                <header>Site header with a long enough line to look like text maybe</header>
                <nav>Home | World | Business | Technology | Sports | Opinion</nav>
                <article>{body}</article>
                <footer>Copyright 2025 Example News. All rights reserved worldwide.</footer>
            </body></html>"#
        )
    }

    fn fast_config() -> ExtractConfig {
        ExtractConfig {
            retry: RetryPolicy {
                max_retries: 2,
                base_delay_secs: 0.0,
                max_jitter_secs: 0.0,
            },
            ..ExtractConfig::default()
        }
    }

    fn extractor(config: ExtractConfig) -> Extractor {
        Extractor::new(&FetchConfig::default(), config).unwrap()
    }

    #[test]
    fn test_extracts_article_paragraphs_without_chrome() {
        let text = extract_article_text("https://example.com/a", &article_html(4), &ExtractConfig::default());
        assert!(text.starts_with("0 This sentence"));
        assert_eq!(text.split("\n\n").count(), 4);
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Site header"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_result_is_truncated() {
        let config = ExtractConfig {
            max_chars: 120,
            ..ExtractConfig::default()
        };
        let text = extract_article_text("https://example.com/a", &article_html(10), &config);
        assert_eq!(text.chars().count(), 120);
    }

    #[test]
    fn test_paragraph_match_is_returned_without_raw_fallback() {
        let menu = "<div>menu item</div>".repeat(30);
        let html = format!(
            "<html><body><p>Acme Corp announced quarterly results on Tuesday.</p>{menu}</body></html>"
        );
        let text = extract_article_text("https://example.com/a", &html, &ExtractConfig::default());
        assert_eq!(text, "Acme Corp announced quarterly results on Tuesday.");
    }

    #[test]
    fn test_suspect_line_text_falls_back_to_raw_page() {
        // No paragraphs: a single long line wins, but the page has more text elsewhere.
        let filler = "<span>word</span>".repeat(60);
        let html = format!(
            "<html><body><div>Just a short teaser line that is long enough.</div>{filler}</body></html>"
        );
        let text = extract_article_text("https://example.com/a", &html, &ExtractConfig::default());
        assert!(text.starts_with("Just a short teaser line that is long enough."));
        assert!(text.contains("word word"));
    }

    #[test]
    fn test_short_page_returns_short_text() {
        let html = "<html><body><p>Just a short teaser paragraph here.</p></body></html>";
        let text = extract_article_text("https://example.com/a", html, &ExtractConfig::default());
        assert_eq!(text, "Just a short teaser paragraph here.");
    }

    #[test]
    fn test_stripped_aside_container_does_not_leak() {
        let sponsored = "Sponsored related stories and promotional links you might enjoy reading.";
        let html = format!(
            r#"<html><body>
                <aside><div class="content"><p>{sponsored}</p><p>{sponsored}</p><p>{sponsored}</p></div></aside>
                <p>{LONG}</p><p>{LONG}</p>
            </body></html>"#
        );
        let text = extract_article_text("https://example.com/a", &html, &ExtractConfig::default());
        assert_eq!(text, format!("{LONG}\n\n{LONG}"));
        assert!(!text.contains("Sponsored"));
    }

    #[test]
    fn test_fetch_error_display_carries_sentinel() {
        let err = ExtractError::from(FetchError::Status {
            url: "https://example.com/a".into(),
            status: 404,
        });
        assert!(err.is_content_failure());
        assert!(err.to_string().starts_with("Content extraction failed: "));

        let setup = ExtractError::from(FetchError::Header {
            name: "Bad Header".into(),
            message: "invalid".into(),
        });
        assert!(!setup.is_content_failure());
    }

    #[tokio::test]
    async fn test_denylisted_url_skips_network() {
        let extractor = extractor(fast_config());
        let text = extractor
            .extract("https://www.microsoft.com/en-us/investor/earnings/fy-2025-q1")
            .await
            .unwrap();
        assert_eq!(
            text,
            "Microsoft investor relations content is not available for extraction."
        );
    }

    #[tokio::test]
    async fn test_extract_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/story")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(article_html(3))
            .create_async()
            .await;

        let text = extractor(fast_config())
            .extract(&format!("{}/story", server.url()))
            .await
            .unwrap();
        assert!(text.contains("2 This sentence"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_blocked_site_yields_content_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/blocked")
            .with_status(403)
            .expect(2)
            .create_async()
            .await;

        let err = extractor(fast_config())
            .extract(&format!("{}/blocked", server.url()))
            .await
            .unwrap_err();
        assert!(err.is_content_failure());
        assert!(err.to_string().starts_with("Content extraction failed: "));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_header_is_setup_failure() {
        let fetch = FetchConfig {
            headers: vec![("Bad Header".to_string(), "x".to_string())],
            ..FetchConfig::default()
        };
        let extractor = Extractor::new(&fetch, fast_config()).unwrap();
        let err = extractor.extract("https://example.com/a").await.unwrap_err();
        assert!(matches!(err, ExtractError::Setup(FetchError::Header { .. })));
    }
}
