//! Meta tag lookup
//!
//! Looks a key up across the attribute conventions pages use for meta
//! tags: plain `name`, `property`, OpenGraph (`og:`), Twitter Card
//! (`twitter:`, under either `property` or `name`) and microdata `itemprop`.

use scraper::{Html, Selector};

/// First non-empty `content` of a meta tag describing `key`.
///
/// Conventions are tried in a fixed order; within one convention the first
/// matching tag decides.
pub fn meta_content(document: &Html, key: &str) -> Option<String> {
    let candidates = [
        format!(r#"meta[name="{key}"]"#),
        format!(r#"meta[property="{key}"]"#),
        format!(r#"meta[property="og:{key}"]"#),
        format!(r#"meta[property="twitter:{key}"]"#),
        format!(r#"meta[name="twitter:{key}"]"#),
        format!(r#"meta[itemprop="{key}"]"#),
    ];

    candidates.iter().find_map(|selector_str| {
        let selector = Selector::parse(selector_str).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(String::from)
    })
}

/// First key in `keys` that any convention answers
pub fn meta_content_any(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta_content(document, key))
}
