//! Data models for news items and their enriched representations.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsRecord`]: One row of the aggregated news CSV, as received
//! - [`EnrichedRecord`]: A news record plus the scraped article body
//! - [`ExtractionStatus`]: How the article body of an [`EnrichedRecord`] was obtained
//!
//! [`EnrichedRecord`] doubles as the cache entry type, so its serialized form is
//! the on-disk cache format and the dataset embedded in the rendered page.

use serde::{Deserialize, Serialize};

/// Prefix of every content-level extraction failure message.
///
/// Anything starting with this prefix is never considered usable article text,
/// wherever it shows up (fresh extraction, cache file, rendered page).
pub const EXTRACTION_FAILED_PREFIX: &str = "Content extraction failed";

/// Minimum number of characters a body needs to count as real article text.
///
/// Shared by the cache adequacy check, the fetch success check and the final
/// quality gate.
pub const MIN_CONTENT_CHARS: usize = 100;

/// A news item as loaded from the aggregated CSV.
///
/// Missing columns fall back to the same placeholders the dashboard has always
/// displayed (see the `default_*` helpers).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsRecord {
    /// Company the item was collected for. May be empty.
    #[serde(default)]
    pub company: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Article URL, or `"#"` when the feed had none.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// Short summary shipped with the feed item.
    #[serde(default = "default_body")]
    pub body: String,
    #[serde(default)]
    pub date: String,
    /// Thumbnail URL. May be empty.
    #[serde(default)]
    pub image: String,
}

fn default_title() -> String {
    "No title".to_string()
}

fn default_url() -> String {
    "#".to_string()
}

fn default_source() -> String {
    "Unknown source".to_string()
}

fn default_body() -> String {
    "No description available".to_string()
}

impl Default for NewsRecord {
    fn default() -> Self {
        Self {
            company: String::new(),
            title: default_title(),
            url: default_url(),
            source: default_source(),
            body: default_body(),
            date: String::new(),
            image: String::new(),
        }
    }
}

impl NewsRecord {
    /// Cache identity of this record: `"<url>_<title>"`.
    ///
    /// The same URL under a different title (e.g. syndicated into another
    /// company's feed) is a distinct slot.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.url, self.title)
    }

    /// Whether the URL points somewhere we can actually request.
    pub fn has_fetchable_url(&self) -> bool {
        !self.url.is_empty() && self.url != "#" && self.url.starts_with("http")
    }
}

/// How the `full_content` of an [`EnrichedRecord`] was obtained.
///
/// Transitions per record:
/// `NotAttempted -> {Cached | CacheInadequate} -> {Success | ContentTooShort | Error}`.
/// `Cached` is terminal, as are the three fetch outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    #[default]
    NotAttempted,
    Cached,
    CacheInadequate,
    Success,
    ContentTooShort,
    Error,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAttempted => "not_attempted",
            Self::Cached => "cached",
            Self::CacheInadequate => "cache_inadequate",
            Self::Success => "success",
            Self::ContentTooShort => "content_too_short",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A news record after enrichment.
///
/// Also the value type of the on-disk cache. Older cache files only carry a
/// subset of the fields (the image was never stored), so every field defaults
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnrichedRecord {
    pub company: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub body: String,
    pub date: String,
    pub image: String,
    /// Extracted article text, a synthetic note, or empty.
    pub full_content: String,
    pub extraction_status: ExtractionStatus,
}

impl From<&NewsRecord> for EnrichedRecord {
    fn from(record: &NewsRecord) -> Self {
        Self {
            company: record.company.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
            source: record.source.clone(),
            body: record.body.clone(),
            date: record.date.clone(),
            image: record.image.clone(),
            full_content: String::new(),
            extraction_status: ExtractionStatus::NotAttempted,
        }
    }
}

/// Whether `content` is good enough to show as the article body.
///
/// Counts characters, not bytes, so non-ASCII articles are measured the same
/// way they are displayed.
pub fn is_adequate_content(content: &str) -> bool {
    !content.starts_with(EXTRACTION_FAILED_PREFIX) && content.chars().count() > MIN_CONTENT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_joins_url_and_title() {
        let record = NewsRecord {
            title: "X Corp wins award".to_string(),
            url: "https://example.com/a".to_string(),
            ..Default::default()
        };
        assert_eq!(record.cache_key(), "https://example.com/a_X Corp wins award");
    }

    #[test]
    fn test_fetchable_url() {
        let mut record = NewsRecord::default();
        assert!(!record.has_fetchable_url());

        record.url = String::new();
        assert!(!record.has_fetchable_url());

        record.url = "ftp://example.com/file".to_string();
        assert!(!record.has_fetchable_url());

        record.url = "https://example.com/a".to_string();
        assert!(record.has_fetchable_url());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ExtractionStatus::ContentTooShort).unwrap();
        assert_eq!(json, "\"content_too_short\"");

        let status: ExtractionStatus = serde_json::from_str("\"cache_inadequate\"").unwrap();
        assert_eq!(status, ExtractionStatus::CacheInadequate);
        assert_eq!(status.to_string(), "cache_inadequate");
    }

    #[test]
    fn test_enriched_record_reads_partial_cache_entry() {
        let json = r#"{"full_content": "Body text", "title": "Hello"}"#;
        let entry: EnrichedRecord = serde_json::from_str(json).unwrap();
        assert_eq!(entry.full_content, "Body text");
        assert_eq!(entry.title, "Hello");
        assert_eq!(entry.extraction_status, ExtractionStatus::NotAttempted);
        assert!(entry.image.is_empty());
    }

    #[test]
    fn test_news_record_defaults_missing_fields() {
        let record: NewsRecord = serde_json::from_str(r#"{"company": "Acme"}"#).unwrap();
        assert_eq!(record.company, "Acme");
        assert_eq!(record.title, "No title");
        assert_eq!(record.url, "#");
        assert_eq!(record.source, "Unknown source");
        assert_eq!(record.body, "No description available");
        assert_eq!(record.date, "");
    }

    #[test]
    fn test_adequacy_threshold_is_exclusive() {
        assert!(!is_adequate_content(&"a".repeat(100)));
        assert!(is_adequate_content(&"a".repeat(101)));
        // multi-byte characters are counted once
        assert!(!is_adequate_content(&"é".repeat(60)));
    }

    #[test]
    fn test_sentinel_is_never_adequate() {
        let long_failure = format!("{}: {}", EXTRACTION_FAILED_PREFIX, "x".repeat(500));
        assert!(!is_adequate_content(&long_failure));
    }
}
