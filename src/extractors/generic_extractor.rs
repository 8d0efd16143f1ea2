//! Generic fallback heuristics
//!
//! Used for whatever the site rule and structured data left empty: meta
//! tags first, then `link[rel=image_src]`, then a scan of `<img>` sources.

use scraper::Html;

use super::{first_attr, parse_selector, meta_content, meta_content_any, PartialMetadata};

/// Sources containing any of these are page chrome, not product shots.
const IMAGE_REJECT_MARKERS: [&str; 3] = ["sprite", "icon", "logo"];

/// Sources containing any of these are taken immediately.
const IMAGE_PREFER_MARKERS: [&str; 3] = ["product", "pdp", "large"];

const PRICE_META_KEYS: [&str; 3] = ["product:price:amount", "price:amount", "price"];

/// Title, image and price from generic page signals.
pub fn extract_generic(document: &Html) -> PartialMetadata {
    let mut meta = PartialMetadata::default();
    fill_from_generic(document, &mut meta);
    meta
}

/// Fill the empty fields of `meta` from generic page signals
pub fn fill_from_generic(document: &Html, meta: &mut PartialMetadata) {
    if meta.title.is_none() {
        meta.offer_title(
            meta_content(document, "title")
                .or_else(|| document_title(document))
                .as_deref(),
        );
    }

    if meta.image.is_none() {
        meta.offer_image(
            meta_content(document, "image")
                .or_else(|| image_src_link(document))
                .or_else(|| scan_images(document))
                .as_deref(),
        );
    }

    if meta.price.is_none() {
        meta.offer_price(meta_content_any(document, &PRICE_META_KEYS).as_deref());
    }
}

fn document_title(document: &Html) -> Option<String> {
    let selector = parse_selector("title")?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn image_src_link(document: &Html) -> Option<String> {
    let selector = parse_selector(r#"link[rel="image_src"]"#)?;
    first_attr(document, &selector, "href")
}

/// Pick a likely product image among all `<img>` elements.
///
/// Only absolute `http(s)` sources qualify. A source with a product marker
/// ends the scan; otherwise the first qualifying source is returned.
pub fn scan_images(document: &Html) -> Option<String> {
    let selector = parse_selector("img[src]")?;
    let mut fallback: Option<String> = None;

    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src").map(str::trim) else {
            continue;
        };
        let lower = src.to_lowercase();
        if !lower.starts_with("http") || IMAGE_REJECT_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        if IMAGE_PREFER_MARKERS.iter().any(|m| lower.contains(m)) {
            return Some(src.to_string());
        }
        if fallback.is_none() {
            fallback = Some(src.to_string());
        }
    }

    fallback
}
