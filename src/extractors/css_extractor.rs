//! CSS selector-based extraction
//!
//! Uses the scraper crate to pull the first usable text or attribute out of
//! an ordered list of selectors.

use scraper::{Html, Selector};

/// Parse a selector, logging and discarding it if invalid.
pub fn parse_selector(selector_str: &str) -> Option<Selector> {
    match Selector::parse(selector_str) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!(selector = selector_str, error = %e, "skipping invalid selector");
            None
        }
    }
}

/// Trimmed text of the first element matching `selector`, if non-empty
pub fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Trimmed attribute of the first element matching `selector`, if non-empty
pub fn first_attr(document: &Html, selector: &Selector, attr_name: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr_name))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Text of the first selector in `selectors` that yields any
pub fn first_text_of(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|s| first_text(document, s))
}
