//! Extraction adapter: rendered page content to ranked records.
//!
//! Selector mechanics are site-specific, so the built-in adapter is driven by
//! a single regex with `name` and `price` capture groups. Each match is one
//! listed item, in page order. Captured text has markup stripped and common
//! HTML entities decoded before it becomes a [`Record`].

use std::sync::LazyLock;

use listwatch_core::Record;
use regex::Regex;

use crate::error::ScraperError;

/// Matches listing cards that mark their title and price with `item-name` /
/// `item-price` classes. Inline markup (`<b>`, `<em>`) inside either field is
/// allowed; block-level closers end the field.
pub const DEFAULT_ITEM_PATTERN: &str = r#"(?is)class="[^"]*\bitem-name\b[^"]*"[^>]*>(?P<name>.*?)</(?:span|a|p|div|li|td|h[1-6])>.*?class="[^"]*\bitem-price\b[^"]*"[^>]*>(?P<price>.*?)</(?:span|a|p|div|li|td|h[1-6])>"#;

static TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));

/// Turns captured page content into a ranked sample (index 0 = top).
pub trait Extractor: Send + Sync {
    fn parse(&self, content: &str) -> Vec<Record>;
}

pub struct PatternExtractor {
    item: Regex,
}

impl PatternExtractor {
    /// Compiles `pattern`, falling back to [`DEFAULT_ITEM_PATTERN`] when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidPattern`] if the pattern does not compile
    /// or lacks a `name` capture group.
    pub fn new(pattern: Option<&str>) -> Result<Self, ScraperError> {
        let item = Regex::new(pattern.unwrap_or(DEFAULT_ITEM_PATTERN))?;
        if !item.capture_names().any(|n| n == Some("name")) {
            return Err(ScraperError::InvalidPattern(regex::Error::Syntax(
                "item pattern needs a `name` capture group".to_string(),
            )));
        }
        Ok(Self { item })
    }
}

impl Extractor for PatternExtractor {
    fn parse(&self, content: &str) -> Vec<Record> {
        self.item
            .captures_iter(content)
            .filter_map(|cap| {
                let name = clean_text(cap.name("name")?.as_str());
                let price = cap
                    .name("price")
                    .map(|m| clean_text(m.as_str()))
                    .unwrap_or_default();
                Record::from_raw(&name, &price)
            })
            .collect()
    }
}

fn clean_text(input: &str) -> String {
    let no_tags = TAGS_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&yen;", "¥")
        .replace("&amp;", "&")
}
