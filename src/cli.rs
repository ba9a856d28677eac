//! Command-line interface definitions for the news dashboard.
//!
//! Every option has a default matching the conventional file layout, so a bare
//! invocation runs the whole pipeline in the current directory. Options can
//! also be provided via environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news dashboard generator.
///
/// # Examples
///
/// ```sh
/// # Defaults: aggregated-news.csv -> index.html, cache in news_cache.json
/// news_dashboard
///
/// # Custom locations and scraper tuning
/// news_dashboard -i feeds/aggregated.csv -o site/index.html --config scrape.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Aggregated news CSV to read
    #[arg(short, long, env = "NEWS_INPUT", default_value = "aggregated-news.csv")]
    pub input: PathBuf,

    /// JSON cache of extracted article bodies
    #[arg(long, env = "NEWS_CACHE", default_value = "news_cache.json")]
    pub cache: PathBuf,

    /// Where to write the dashboard page
    #[arg(short, long, env = "NEWS_OUTPUT", default_value = "index.html")]
    pub output: PathBuf,

    /// Directory holding per-company `news-<company>.csv` feeds
    #[arg(long, default_value = ".")]
    pub company_dir: PathBuf,

    /// Optional YAML file overriding scraper settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
