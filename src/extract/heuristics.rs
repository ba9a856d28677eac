//! Ordered strategies for locating article text in a cleaned document.
//!
//! Each strategy is a pure function from the parsed (already stripped)
//! document to `Option<String>`; [`HEURISTICS`] lists them in priority order
//! and the first `Some` wins.
//!
//! Selection always starts at the root element. Stripped nodes stay in the
//! tree arena, and `Html::select` would still visit them.

use super::dom::{self, PARAGRAPH};
use crate::config::ExtractConfig;
use scraper::{ElementRef, Html};

/// Inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub config: &'a ExtractConfig,
    /// Host of the article URL, when it parsed.
    pub host: Option<&'a str>,
}

pub type Heuristic = fn(&Html, &Context) -> Option<String>;

/// A named strategy in the chain.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: Heuristic,
    /// Whether a result from this strategy still goes through the
    /// suspiciously-short check. Targeted strategies are taken as is.
    pub checked: bool,
}

/// Text picked by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub strategy: &'static str,
    pub text: String,
    pub checked: bool,
}

/// Strategies in the order they are tried.
pub const HEURISTICS: &[Strategy] = &[
    Strategy { name: "site_override", run: site_override, checked: false },
    Strategy { name: "content_container", run: content_container, checked: false },
    Strategy { name: "page_paragraphs", run: page_paragraphs, checked: false },
    Strategy { name: "body_paragraphs", run: body_paragraphs, checked: true },
    Strategy { name: "page_lines", run: page_lines, checked: true },
];

/// Run the chain; the first strategy that yields text wins.
pub fn first_match(document: &Html, ctx: &Context) -> Option<Match> {
    HEURISTICS.iter().find_map(|strategy| {
        (strategy.run)(document, ctx).map(|text| Match {
            strategy: strategy.name,
            text,
            checked: strategy.checked,
        })
    })
}

fn join_paragraphs(paragraphs: Vec<String>) -> Option<String> {
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// Host-specific containers, e.g. for aggregators whose generic markup is
/// mostly teaser links.
pub fn site_override(document: &Html, ctx: &Context) -> Option<String> {
    let host = ctx.host?;
    let rule = ctx
        .config
        .site_rules
        .iter()
        .find(|rule| rule.matches_host(host))?;

    let container = rule
        .selectors
        .iter()
        .filter_map(|raw| dom::parse_selector(raw))
        .find_map(|selector| document.root_element().select(&selector).next())?;

    join_paragraphs(dom::paragraph_texts(&container, 0))
}

/// First generic article container with enough visible text.
pub fn find_container<'a>(document: &'a Html, config: &ExtractConfig) -> Option<ElementRef<'a>> {
    config
        .content_selectors
        .iter()
        .filter_map(|raw| dom::parse_selector(raw))
        .find_map(|selector| {
            document
                .root_element()
                .select(&selector)
                .find(|el| dom::visible_len(el) > config.min_container_chars)
        })
}

/// Paragraphs of the generic container, or its text lines when it has no
/// paragraphs at all.
pub fn content_container(document: &Html, ctx: &Context) -> Option<String> {
    let container = find_container(document, ctx.config)?;

    if container.select(&PARAGRAPH).next().is_some() {
        join_paragraphs(dom::paragraph_texts(&container, 0))
    } else {
        join_paragraphs(dom::text_lines(&container, ctx.config.min_paragraph_chars))
    }
}

/// Leading substantial paragraphs of a page that has no recognizable container.
pub fn page_paragraphs(document: &Html, ctx: &Context) -> Option<String> {
    if find_container(document, ctx.config).is_some() {
        return None;
    }
    let paragraphs = dom::paragraph_texts(&document.root_element(), ctx.config.min_paragraph_chars)
        .into_iter()
        .take(ctx.config.max_page_paragraphs)
        .collect();
    join_paragraphs(paragraphs)
}

/// Every substantial paragraph in the body.
pub fn body_paragraphs(document: &Html, ctx: &Context) -> Option<String> {
    let body = dom::body(document)?;
    join_paragraphs(dom::paragraph_texts(&body, ctx.config.min_paragraph_chars))
}

/// Substantial text lines of the whole page.
pub fn page_lines(document: &Html, ctx: &Context) -> Option<String> {
    join_paragraphs(dom::text_lines(
        &document.root_element(),
        ctx.config.min_paragraph_chars,
    ))
}
