//! Static dashboard page.
//!
//! One self-contained HTML file: a card grid of the raw news items, a
//! floating chat assistant, and a `<script>` that embeds the enriched dataset
//! as `newsData` followed by the keyword-search assistant code.

use crate::models::{EnrichedRecord, NewsRecord};
use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const STYLES: &str = include_str!("../../assets/dashboard.css");
const ASSISTANT_JS: &str = include_str!("../../assets/assistant.js");

/// Render the full dashboard page.
pub fn render_page(
    items: &[NewsRecord],
    enriched: &[EnrichedRecord],
    generated_on: NaiveDate,
) -> Result<String, serde_json::Error> {
    let data = embed_json(enriched)?;
    let mut page = String::with_capacity(STYLES.len() + ASSISTANT_JS.len() + data.len() + 4096);

    write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta http-equiv="refresh" content="604800">
    <title>Company News Dashboard</title>
    <style>
{STYLES}
    </style>
</head>
<body>
    <h1>Company News Dashboard</h1>
    <div class="news-grid">
"#
    )
    .unwrap();

    for item in items {
        page.push_str(&news_card(item));
    }

    write!(
        page,
        r#"    </div>
    <p class="timestamp">Last updated: {generated_on}</p>

    <button class="chat-toggle-button" title="Open Chat Assistant">💬</button>
    <div class="chatbot-container">
        <div class="chatbot-header">
            <span class="chatbot-title">News Assistant</span>
            <span class="close-chat" style="cursor: pointer;">✕</span>
        </div>
        <div class="chatbot-messages">
            <div class="message bot-message">Hi! I'm your news assistant. Ask me anything about the news articles on this page.</div>
        </div>
        <div class="chatbot-input">
            <input type="text" placeholder="Ask a question...">
            <button>Send</button>
        </div>
    </div>

    <script>
        const newsData = {data};
{ASSISTANT_JS}
    </script>
</body>
</html>
"#
    )
    .unwrap();

    Ok(page)
}

/// One card in the news grid.
pub fn news_card(item: &NewsRecord) -> String {
    let title = encode_text(&item.title);
    let mut card = String::from("        <div class=\"news-card\">\n");

    if !item.company.is_empty() {
        writeln!(card, "            <span class=\"company-tag\">{}</span>", encode_text(&item.company)).unwrap();
    }
    if !item.image.is_empty() && item.image != "None" {
        writeln!(
            card,
            "            <div class=\"news-image\"><img src=\"{}\" alt=\"{}\"></div>",
            encode_double_quoted_attribute(&item.image),
            encode_double_quoted_attribute(&item.title)
        ).unwrap();
    }

    // Feeds emit a "No news ..." row for companies without items.
    let no_news = item.title.contains("No news");
    if no_news {
        card.push_str("            <h3 class=\"news-title\">No news</h3>\n");
    } else {
        writeln!(
            card,
            "            <h3 class=\"news-title\"><a href=\"{}\" target=\"_blank\">{}</a></h3>",
            encode_double_quoted_attribute(&item.url),
            title
        ).unwrap();
    }

    writeln!(card, "            <div class=\"news-source\">{}</div>", encode_text(&item.source)).unwrap();
    writeln!(card, "            <p>{}</p>", encode_text(&item.body)).unwrap();
    if !no_news {
        writeln!(card, "            <div class=\"news-date\">{}</div>", encode_text(&item.date)).unwrap();
    }
    card.push_str("        </div>\n");
    card
}

/// Serialize records for embedding inside a `<script>` element.
pub fn embed_json(records: &[EnrichedRecord]) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(records)?.replace("</", "<\\/"))
}

/// Write the page to `path`, replacing any previous version.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_page(path: impl AsRef<Path>, page: &str) -> std::io::Result<()> {
    fs::write(path.as_ref(), page).await?;
    info!(bytes = page.len(), "Wrote dashboard page");
    Ok(())
}
