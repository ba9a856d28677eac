//! Loading news items from CSV.
//!
//! The aggregated feed is one CSV with a header row. Columns are matched by
//! name; unknown columns are ignored and missing ones take the placeholders
//! documented on [`NewsRecord`].
//!
//! Per-company feeds (`news-<company>.csv`) are only consulted to recover the
//! company of items whose `company` cell is empty.

use crate::models::NewsRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load every row of the aggregated news CSV.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_news_items(path: impl AsRef<Path>) -> Result<Vec<NewsRecord>, LoadError> {
    let path = path.as_ref();
    let csv_error = |source| LoadError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let records = reader
        .deserialize::<NewsRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_error)?;

    info!(count = records.len(), "Loaded news items");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    title: Option<String>,
}

/// Map titles to company names from `news-<company>.csv` files in `dir`.
///
/// Unreadable files are logged and skipped; a later file wins when two feeds
/// carry the same title.
#[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display()))]
pub fn company_mapping(dir: impl AsRef<Path>) -> Result<HashMap<String, String>, LoadError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut feeds: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter_map(|path| {
            let company = company_from_file_name(path.file_name()?.to_str()?)?;
            Some((company.to_string(), path))
        })
        .collect();
    feeds.sort();

    let mut mapping = HashMap::new();
    for (company, path) in feeds {
        match read_titles(&path) {
            Ok(titles) => {
                debug!(%company, titles = titles.len(), "Read company feed");
                for title in titles {
                    mapping.insert(title, company.clone());
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Error reading company feed"),
        }
    }

    info!(titles = mapping.len(), "Built title to company mapping");
    Ok(mapping)
}

fn company_from_file_name(name: &str) -> Option<&str> {
    name.strip_prefix("news-")?
        .strip_suffix(".csv")
        .filter(|company| !company.is_empty())
}

fn read_titles(path: &Path) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut titles = Vec::new();
    for row in reader.deserialize::<TitleRow>() {
        if let Some(title) = row?.title {
            titles.push(title);
        }
    }
    Ok(titles)
}

/// Fill empty `company` fields from `mapping`. Returns how many were filled.
pub fn apply_company_mapping(records: &mut [NewsRecord], mapping: &HashMap<String, String>) -> usize {
    let mut filled = 0;
    for record in records.iter_mut().filter(|r| r.company.trim().is_empty()) {
        if let Some(company) = mapping.get(&record.title) {
            record.company = company.clone();
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_news_items_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aggregated-news.csv");
        std::fs::write(
            &path,
            "company,title,url,source,body,date,query\n\
             Acme,\"Acme, Inc. expands\",https://example.com/a,Wire,Summary,2025-01-02,acme\n",
        )
        .unwrap();

        let records = load_news_items(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Acme, Inc. expands");
        assert_eq!(records[0].url, "https://example.com/a");
        assert_eq!(records[0].image, "");
    }

    #[test]
    fn test_missing_columns_take_placeholders() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aggregated-news.csv");
        std::fs::write(&path, "company\nAcme\n").unwrap();

        let records = load_news_items(&path).unwrap();
        assert_eq!(records[0].title, "No title");
        assert_eq!(records[0].url, "#");
        assert_eq!(records[0].source, "Unknown source");
        assert_eq!(records[0].body, "No description available");
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = load_news_items("/nonexistent/aggregated-news.csv").unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn test_company_mapping_from_feed_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("news-Acme.csv"), "title,url\nAcme story,https://a\n").unwrap();
        std::fs::write(dir.path().join("news-Globex.csv"), "title\nGlobex story\n").unwrap();
        std::fs::write(dir.path().join("other.csv"), "title\nIgnored\n").unwrap();
        std::fs::write(dir.path().join("news-.csv"), "title\nNameless\n").unwrap();

        let mapping = company_mapping(dir.path()).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["Acme story"], "Acme");
        assert_eq!(mapping["Globex story"], "Globex");
    }

    #[test]
    fn test_apply_company_mapping_only_fills_blanks() {
        let mapping = HashMap::from([
            ("Acme story".to_string(), "Acme".to_string()),
            ("Globex story".to_string(), "Globex".to_string()),
        ]);
        let mut records = vec![
            NewsRecord {
                title: "Acme story".to_string(),
                ..Default::default()
            },
            NewsRecord {
                company: "Initech".to_string(),
                title: "Globex story".to_string(),
                ..Default::default()
            },
        ];

        assert_eq!(apply_company_mapping(&mut records, &mapping), 1);
        assert_eq!(records[0].company, "Acme");
        assert_eq!(records[1].company, "Initech");
    }
}
