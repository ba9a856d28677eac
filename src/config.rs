//! Scraper configuration.
//!
//! Everything the fetcher, extractor and enrichment loop used to hard-code
//! (browser identities, denylist, per-site selectors, thresholds, delays) lives
//! in [`ScrapeConfig`]. Every field has a default, so an optional YAML file only
//! needs to name what it overrides:
//!
//! ```yaml
//! fetch:
//!   timeout_secs: 20
//! extract:
//!   retry:
//!     max_retries: 3
//! politeness:
//!   min_delay_secs: 0.5
//!   max_delay_secs: 1.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration for one enrichment run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub politeness: PolitenessConfig,
}

impl ScrapeConfig {
    /// Load a YAML config file, filling unspecified fields with defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        info!("Loaded scraper configuration");
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}

/// Retry/backoff settings for one kind of request.
///
/// The wait before retry `n` (0-indexed) is `base_delay * 2^n` plus a uniform
/// jitter in `[0, max_jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_retries: usize,
    pub base_delay_secs: f64,
    pub max_jitter_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 2.0,
            max_jitter_secs: 1.0,
        }
    }
}

impl RetryPolicy {
    /// The budget used when fetching article pages.
    pub fn article() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 3.0,
            ..Self::default()
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay_secs.max(0.0))
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_secs_f64(self.max_jitter_secs.max(0.0))
    }
}

/// HTTP identity and timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    /// One of these is picked at random for every request.
    pub user_agents: Vec<String>,
    /// Headers sent with every request besides `User-Agent`.
    pub headers: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agents: [
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:94.0) Gecko/20100101 Firefox/94.0",
                "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            headers: [
                ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
                ("Accept-Language", "en-US,en;q=0.5"),
                ("Referer", "https://www.google.com/"),
                ("DNT", "1"),
                ("Connection", "keep-alive"),
                ("Upgrade-Insecure-Requests", "1"),
                ("Cache-Control", "max-age=0"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A URL that is known to yield only boilerplate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DenyRule {
    /// Substring matched against the full URL.
    pub url_contains: String,
    /// Returned in place of article text.
    pub note: String,
}

/// Container selectors to prefer on a specific host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteRule {
    /// Matches the URL host itself or any subdomain of it.
    pub host: String,
    /// CSS selectors, most specific first.
    pub selectors: Vec<String>,
}

impl SiteRule {
    pub fn matches_host(&self, host: &str) -> bool {
        host == self.host || host.ends_with(&format!(".{}", self.host))
    }
}

/// Content extraction heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub retry: RetryPolicy,
    pub denylist: Vec<DenyRule>,
    pub site_rules: Vec<SiteRule>,
    /// Tags removed from the document before any text is read.
    pub strip_tags: Vec<String>,
    /// Generic article containers, tried in order.
    pub content_selectors: Vec<String>,
    /// A container must carry more visible text than this to be picked.
    pub min_container_chars: usize,
    /// Paragraphs and text lines at or below this length are treated as chrome.
    pub min_paragraph_chars: usize,
    /// Cap on paragraphs taken when no container was found.
    pub max_page_paragraphs: usize,
    /// Below this many characters the extracted text is suspect...
    pub suspect_min_chars: usize,
    /// ...and likewise below this many words.
    pub suspect_min_words: usize,
    /// Raw page text must exceed this to replace suspect text.
    pub raw_fallback_min_chars: usize,
    /// Hard cap on returned text, in characters.
    pub max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::article(),
            denylist: vec![DenyRule {
                url_contains: "microsoft.com/en-us/investor/".to_string(),
                note: "Microsoft investor relations content is not available for extraction."
                    .to_string(),
            }],
            site_rules: vec![SiteRule {
                host: "msn.com".to_string(),
                selectors: [
                    "div.articlecontent",
                    "div.mainarticle",
                    "div.contentid",
                    "div.primary-content",
                    "div[data-testid='article-body']",
                    "div[data-testid='content-canvas']",
                    "article",
                    "div.article-body",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            }],
            strip_tags: ["script", "style", "nav", "header", "footer", "aside", "form"]
                .into_iter()
                .map(String::from)
                .collect(),
            content_selectors: [
                "article",
                ".article",
                ".post-content",
                ".story",
                "main",
                "#content",
                ".content",
                ".post",
                ".entry-content",
                ".article-content",
                ".article__content",
                ".article-body",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_container_chars: 150,
            min_paragraph_chars: 30,
            max_page_paragraphs: 20,
            suspect_min_chars: 100,
            suspect_min_words: 20,
            raw_fallback_min_chars: 200,
            max_chars: 10_000,
        }
    }
}

/// Delay between records that actually hit the network.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolitenessConfig {
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 1.5,
            max_delay_secs: 4.0,
        }
    }
}

impl PolitenessConfig {
    /// No delay at all.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            min_delay_secs: 0.0,
            max_delay_secs: 0.0,
        }
    }
}
