//! Helpers for reading text out of a parsed `scraper` document.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

pub static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector is valid"));

pub static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("static selector is valid"));

/// Parse a configured selector, logging and skipping invalid ones.
pub fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = raw, error = %e, "Ignoring invalid CSS selector");
            None
        }
    }
}

/// Detach every element matching one of `tags` from the tree.
///
/// Runs before any text is read so navigation, scripts and forms never leak
/// into the article body. Detached nodes remain in the arena, so later
/// lookups must walk from [`Html::root_element`] rather than [`Html::select`].
pub fn strip_elements(document: &mut Html, tags: &[String]) -> usize {
    let mut removed = 0;
    for tag in tags {
        let Some(selector) = parse_selector(tag) else {
            continue;
        };
        let ids: Vec<_> = document
            .root_element()
            .select(&selector)
            .map(|el| el.id())
            .collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
    }
    removed
}

/// Text nodes of `element`, each trimmed, empty ones dropped.
fn text_pieces<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element.text().map(str::trim).filter(|s| !s.is_empty())
}

/// Visible text of an element, pieces joined by single spaces.
pub fn stripped_text(element: &ElementRef) -> String {
    text_pieces(element).collect::<Vec<_>>().join(" ")
}

/// Number of visible characters, ignoring whitespace between text nodes.
pub fn visible_len(element: &ElementRef) -> usize {
    text_pieces(element).map(|s| s.chars().count()).sum()
}

/// Texts of `<p>` descendants longer than `min_chars` characters.
pub fn paragraph_texts(element: &ElementRef, min_chars: usize) -> Vec<String> {
    element
        .select(&PARAGRAPH)
        .map(|p| stripped_text(&p))
        .filter(|text| text.chars().count() > min_chars)
        .collect()
}

/// Non-blank text lines of `element`, whitespace collapsed, longer than
/// `min_chars` characters.
pub fn text_lines(element: &ElementRef, min_chars: usize) -> Vec<String> {
    text_pieces(element)
        .flat_map(str::lines)
        .map(normalize_whitespace)
        .filter(|line| line.chars().count() > min_chars)
        .collect()
}

pub fn normalize_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The `<body>` element; `html5ever` always synthesizes one.
pub fn body(document: &Html) -> Option<ElementRef<'_>> {
    document.root_element().select(&BODY).next()
}

/// Whole-document visible text, space-joined.
pub fn page_text(document: &Html) -> String {
    stripped_text(&document.root_element())
}

/// Truncate to at most `max` characters, on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_elements_removes_chrome() {
        let mut document = Html::parse_document(
            r#"<html><body>
                <nav>Menu</nav>
                <script>var tracking = 1;</script>
                <p>Kept paragraph</p>
                <footer><p>Copyright notice</p></footer>
            </body></html>"#,
        );
        let tags: Vec<String> = ["script", "nav", "footer"].iter().map(|s| s.to_string()).collect();
        let removed = strip_elements(&mut document, &tags);

        assert_eq!(removed, 3);
        let text = page_text(&document);
        assert!(text.contains("Kept paragraph"));
        assert!(!text.contains("Menu"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let mut document = Html::parse_document("<p>Still here</p>");
        let removed = strip_elements(&mut document, &["[[nope".to_string()]);
        assert_eq!(removed, 0);
        assert!(page_text(&document).contains("Still here"));
    }

    #[test]
    fn test_visible_len_ignores_markup_whitespace() {
        let document = Html::parse_fragment("<div>\n  <span>abc</span>\n  <b> de </b>\n</div>");
        let div = document.select(&parse_selector("div").unwrap()).next().unwrap();
        assert_eq!(visible_len(&div), 5);
        assert_eq!(stripped_text(&div), "abc de");
    }

    #[test]
    fn test_text_lines_filters_short_lines() {
        let document = Html::parse_fragment(
            "<div>short line\n   this   line has plenty of   characters to keep   \nok</div>",
        );
        let div = document.select(&parse_selector("div").unwrap()).next().unwrap();
        assert_eq!(
            text_lines(&div, 30),
            vec!["this line has plenty of characters to keep".to_string()]
        );
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }
}
