//! Cache-aware enrichment of news records with full article text.
//!
//! Records are processed strictly one at a time. For each record:
//!
//! 1. Records without a real `http(s)` URL are left `not_attempted`
//! 2. An adequate cached body is reused (`cached`) and the network is skipped;
//!    an inadequate one (`cache_inadequate`) is re-fetched
//! 3. Fresh text over the quality bar is a `success` and goes into the cache;
//!    anything else is `content_too_short` and falls back to the feed summary
//! 4. Setup failures mark only that record `error`
//!
//! After every record that actually hit the network the loop sleeps for a
//! random politeness delay, so hosts never see bursts from us.

use crate::cache::CacheMap;
use crate::config::PolitenessConfig;
use crate::extract::ContentSource;
use crate::models::{EnrichedRecord, ExtractionStatus, NewsRecord, is_adequate_content};
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Enriches records through a [`ContentSource`], consulting a cache first.
#[derive(Debug)]
pub struct Enricher<S> {
    source: S,
    politeness: PolitenessConfig,
}

impl<S> Enricher<S>
where
    S: ContentSource,
{
    /// Create an enricher.
    ///
    /// # Arguments
    ///
    /// * `source` - Where article text comes from, normally an
    ///   [`Extractor`](crate::extract::Extractor)
    /// * `politeness` - Bounds of the random delay after each network fetch
    ///
    /// # Example
    ///
    /// ```ignore
    /// let extractor = Extractor::new(&config.fetch, config.extract.clone())?;
    /// let enricher = Enricher::new(extractor, config.politeness);
    /// let enriched = enricher.enrich(&records, &mut cache).await;
    /// ```
    pub fn new(source: S, politeness: PolitenessConfig) -> Self {
        Self { source, politeness }
    }

    /// Enrich every record, in order, updating `cache` with fresh successes.
    ///
    /// # Arguments
    ///
    /// * `records` - Input items; never modified
    /// * `cache` - Loaded cache; successful extractions are inserted under
    ///   [`NewsRecord::cache_key`]
    ///
    /// # Returns
    ///
    /// Exactly one [`EnrichedRecord`] per input record, in input order. No
    /// per-record failure escapes; it is reflected in the record's status.
    #[instrument(level = "info", skip_all, fields(records = records.len(), cached = cache.len()))]
    pub async fn enrich(&self, records: &[NewsRecord], cache: &mut CacheMap) -> Vec<EnrichedRecord> {
        let mut enriched = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            let (article, fetched) = self.enrich_one(record, cache).await;
            debug!(index = i, status = %article.extraction_status, "Record enriched");
            enriched.push(article);

            if fetched && i + 1 < records.len() {
                let delay = self.politeness_delay();
                debug!(?delay, "Politeness delay");
                sleep(delay).await;
            }
        }

        enriched
    }

    /// Enrich one record.
    ///
    /// # Returns
    ///
    /// The enriched record and whether the network was used, which decides
    /// if a politeness delay follows.
    #[instrument(level = "info", skip_all, fields(title = %record.title, url = %record.url))]
    pub async fn enrich_one(&self, record: &NewsRecord, cache: &mut CacheMap) -> (EnrichedRecord, bool) {
        let mut article = EnrichedRecord::from(record);

        if !record.has_fetchable_url() {
            debug!("No fetchable URL; leaving record as is");
            return (article, false);
        }

        let key = record.cache_key();
        if let Some(entry) = cache.get(&key).filter(|e| !e.full_content.is_empty()) {
            if is_adequate_content(&entry.full_content) {
                info!("Using cached content");
                article.full_content = entry.full_content.clone();
                article.extraction_status = ExtractionStatus::Cached;
                return (article, false);
            }
            info!("Cached content seems inadequate; re-fetching");
            article.extraction_status = ExtractionStatus::CacheInadequate;
        }

        info!("Fetching content");
        let text = match self.source.extract(&record.url).await {
            Ok(text) => text,
            Err(e) if e.is_content_failure() => {
                warn!(error = %e, "Content extraction failed");
                e.to_string()
            }
            Err(e) => {
                error!(error = %e, "Error processing URL");
                article.extraction_status = ExtractionStatus::Error;
                article.full_content = format!("Error extracting content: {e}");
                return (article, false);
            }
        };

        if is_adequate_content(&text) {
            info!(chars = text.chars().count(), "Extracted article content");
            article.full_content = text;
            article.extraction_status = ExtractionStatus::Success;
            cache.insert(key, article.clone());
        } else {
            warn!(
                chars = text.chars().count(),
                preview = %truncate_for_log(&text, 80),
                "Fetched content is too short or empty"
            );
            article.full_content = summary_fallback(&record.body);
            article.extraction_status = ExtractionStatus::ContentTooShort;
        }

        (article, true)
    }

    fn politeness_delay(&self) -> Duration {
        let min = self.politeness.min_delay_secs.max(0.0);
        let max = self.politeness.max_delay_secs.max(min);
        Duration::from_secs_f64(rng().random_range(min..=max))
    }
}

/// Body shown when the article itself could not be extracted.
pub fn summary_fallback(body: &str) -> String {
    format!(
        "Note: Content could not be properly extracted from this source. Using summary instead.\n\n{body}"
    )
}
