//! HTML metadata extractors
//!
//! Each module reads one kind of source from a parsed document. Results are
//! collected into a [`PartialMetadata`] where the first stage to supply a
//! field keeps it.

mod css_extractor;
mod generic_extractor;
mod js_extractor;
mod jsonld_extractor;
mod meta_extractor;
mod microdata_extractor;

pub use css_extractor::*;
pub use generic_extractor::*;
pub use js_extractor::*;
pub use jsonld_extractor::*;
pub use meta_extractor::*;
pub use microdata_extractor::*;

use scraper::Html;
use serde_json::Value;

use crate::normalize::looks_like_price;

/// Price and image from embedded structured data.
pub fn extract_structured_data(document: &Html) -> PartialMetadata {
    let mut meta = PartialMetadata::default();
    fill_from_structured_data(document, &mut meta);
    meta
}

/// JSON-LD first, then microdata for whatever is still missing.
pub fn fill_from_structured_data(document: &Html, meta: &mut PartialMetadata) {
    fill_from_jsonld(document, meta);
    if !meta.has_price_and_image() {
        fill_from_microdata(document, meta);
    }
}

/// Metadata gathered so far for one page. Fields are set at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<String>,
}

impl PartialMetadata {
    /// Offer a title candidate. Ignored if a title is already set or the
    /// candidate is blank.
    pub fn offer_title(&mut self, candidate: Option<&str>) {
        offer(&mut self.title, candidate, |_| true);
    }

    pub fn offer_image(&mut self, candidate: Option<&str>) {
        offer(&mut self.image, candidate, |_| true);
    }

    /// Offer a raw price label. Labels without a single digit do not count.
    pub fn offer_price(&mut self, candidate: Option<&str>) {
        offer(&mut self.price, candidate, looks_like_price);
    }

    /// Price and image are both known. Structured data never supplies a
    /// title, so it is not part of this check.
    pub fn has_price_and_image(&self) -> bool {
        self.price.is_some() && self.image.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_price_and_image() && self.title.is_some()
    }
}

fn offer(slot: &mut Option<String>, candidate: Option<&str>, accept: impl Fn(&str) -> bool) {
    if slot.is_some() {
        return;
    }
    if let Some(value) = candidate.map(str::trim) {
        if !value.is_empty() && accept(value) {
            *slot = Some(value.to_string());
        }
    }
}

/// Render a scalar JSON value as text. Strings are trimmed, numbers printed;
/// anything else (objects, arrays, null, booleans) has no text form here.
pub(crate) fn json_scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
