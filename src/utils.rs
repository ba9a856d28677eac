//! Utility functions for logging, run summaries and file system preparation.

use crate::models::{EnrichedRecord, ExtractionStatus};
use itertools::Itertools;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
        None => s.to_string(),
    }
}

/// Count enriched records per extraction status, most frequent first.
///
/// Ties are broken by status name so the summary line is stable between runs.
pub fn status_counts(records: &[EnrichedRecord]) -> Vec<(ExtractionStatus, usize)> {
    records
        .iter()
        .map(|r| r.extraction_status)
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())))
        .collect()
}

/// Render [`status_counts`] as `status=count` pairs for a log line.
pub fn format_status_counts(counts: &[(ExtractionStatus, usize)]) -> String {
    counts
        .iter()
        .map(|(status, count)| format!("{status}={count}"))
        .join(", ")
}

/// Make sure the directory that will hold `path` exists.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            debug!(parent = %parent.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}
