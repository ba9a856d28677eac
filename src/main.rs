//! # News Dashboard
//!
//! A batch pipeline that turns an aggregated per-company news CSV into a
//! static, searchable dashboard page. Each news item is enriched with the full
//! text of the linked article, scraped politely and cached between runs.
//!
//! ## Usage
//!
//! ```sh
//! news_dashboard -i aggregated-news.csv -o index.html
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Loading**: Read news items from CSV, fill missing companies from per-company feeds
//! 2. **Cache**: Load previously extracted article bodies
//! 3. **Enrichment**: Fetch and extract article text for uncached items, one at a time
//! 4. **Persistence**: Save the updated cache
//! 5. **Output**: Render the dashboard page with the embedded dataset

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod enrich;
mod extract;
mod fetch;
mod loader;
mod models;
mod outputs;
mod utils;

use cache::CacheStore;
use cli::Cli;
use config::ScrapeConfig;
use enrich::Enricher;
use extract::Extractor;
use outputs::html;
use utils::{ensure_parent_dir, format_status_counts, status_counts};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_dashboard starting up");

    let args = Cli::parse();
    debug!(?args.input, ?args.cache, ?args.output, "Parsed CLI arguments");

    // ---- Configuration ----
    let config = match &args.config {
        Some(path) => match ScrapeConfig::from_yaml_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Falling back to default scraper configuration");
                ScrapeConfig::default()
            }
        },
        None => ScrapeConfig::default(),
    };

    // ---- Load news items ----
    let mut news_items = loader::load_news_items(&args.input)?;
    match loader::company_mapping(&args.company_dir) {
        Ok(mapping) => {
            let filled = loader::apply_company_mapping(&mut news_items, &mapping);
            info!(titles = mapping.len(), filled, "Applied company mapping");
        }
        Err(e) => warn!(error = %e, "Could not build company mapping"),
    }

    // ---- Enrich with article content ----
    let store = CacheStore::new(&args.cache);
    let mut cache = store.load().await;

    let extractor = Extractor::new(&config.fetch, config.extract.clone())?;
    let enricher = Enricher::new(extractor, config.politeness);
    let enriched = enricher.enrich(&news_items, &mut cache).await;

    info!(
        total = enriched.len(),
        statuses = %format_status_counts(&status_counts(&enriched)),
        "Enrichment complete"
    );

    if let Err(e) = ensure_parent_dir(store.path()).await {
        warn!(error = %e, "Could not prepare cache directory");
    }
    store.save(&cache).await;

    // ---- Render dashboard ----
    let page = html::render_page(&news_items, &enriched, Local::now().date_naive())?;
    if let Err(e) = ensure_parent_dir(&args.output).await {
        error!(path = %args.output.display(), error = %e, "Failed to prepare output directory");
    }
    if let Err(e) = html::write_page(&args.output, &page).await {
        error!(path = %args.output.display(), error = %e, "Failed writing dashboard page");
    } else {
        info!(path = %args.output.display(), "HTML dashboard created successfully");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
