//! JSON-LD extraction from HTML
//!
//! Finds the first schema.org `Product` in `<script type="application/ld+json">`
//! blocks and reads its offer price and image. Supports top-level arrays,
//! `@graph` arrays and multiple blocks.

use scraper::{Html, Selector};
use serde_json::Value;

use super::{json_scalar_text, PartialMetadata};
use crate::error::ParseError;

/// Price and image from JSON-LD `Product` data.
pub fn extract_jsonld_product(document: &Html) -> PartialMetadata {
    let mut meta = PartialMetadata::default();
    fill_from_jsonld(document, &mut meta);
    meta
}

/// Fill the empty price/image fields of `meta` from JSON-LD blocks, in
/// document order, until both are known.
pub fn fill_from_jsonld(document: &Html, meta: &mut PartialMetadata) {
    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(s) => s,
        Err(_) => return,
    };

    for element in document.select(&selector) {
        if meta.has_price_and_image() {
            break;
        }

        let text = element.text().collect::<String>();
        let json = match parse_block(&text) {
            Ok(Some(json)) => json,
            Ok(None) => continue,
            Err(e) => {
                // A broken block must not stop the scan.
                tracing::debug!(error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };

        let mut candidates = Vec::new();
        collect_entities(&json, &mut candidates);

        if let Some(product) = candidates.into_iter().find(|c| is_product(c)) {
            if meta.image.is_none() {
                meta.offer_image(product.get("image").and_then(image_url).as_deref());
            }
            if meta.price.is_none() {
                meta.offer_price(product.get("offers").and_then(offer_price).as_deref());
            }
        }
    }
}

/// Parse one block. `Ok(None)` for an empty block.
fn parse_block(text: &str) -> Result<Option<Value>, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Flatten a block into candidate entities, in document order
fn collect_entities<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(arr) => {
            for item in arr {
                collect_entities(item, out);
            }
        }
        Value::Object(obj) => {
            out.push(value);
            if let Some(Value::Array(graph)) = obj.get("@graph") {
                for item in graph {
                    collect_entities(item, out);
                }
            }
        }
        _ => {}
    }
}

fn is_product(entity: &Value) -> bool {
    match entity.get("@type") {
        Some(Value::String(t)) => is_product_type(t),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(is_product_type),
        _ => false,
    }
}

fn is_product_type(type_name: &str) -> bool {
    let clean = type_name
        .strip_prefix("https://schema.org/")
        .or_else(|| type_name.strip_prefix("http://schema.org/"))
        .unwrap_or(type_name);
    clean == "Product"
}

/// `image` may be a URL, a list (first wins) or an `ImageObject` with a `url`
fn image_url(image: &Value) -> Option<String> {
    match image {
        Value::Array(arr) => arr.first().and_then(image_url),
        Value::Object(obj) => obj.get("url").and_then(json_scalar_text),
        other => json_scalar_text(other),
    }
}

/// `offers` may be a single offer or a list; price, then lowPrice, then highPrice
fn offer_price(offers: &Value) -> Option<String> {
    let offer = match offers {
        Value::Array(arr) => arr.first()?,
        other => other,
    };
    ["price", "lowPrice", "highPrice"]
        .iter()
        .find_map(|key| offer.get(*key).and_then(json_scalar_text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> PartialMetadata {
        extract_jsonld_product(&Html::parse_document(html))
    }

    #[test]
    fn test_extract_simple_product() {
        let html = r#"
        <html>
        <head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Product",
                "name": "Test Product",
                "image": "https://cdn.example.com/p.jpg",
                "offers": {"@type": "Offer", "price": "999", "priceCurrency": "INR"}
            }
            </script>
        </head>
        </html>
        "#;

        let meta = extract(html);
        assert_eq!(meta.price.as_deref(), Some("999"));
        assert_eq!(meta.image.as_deref(), Some("https://cdn.example.com/p.jpg"));
        assert_eq!(meta.title, None);
    }

    #[test]
    fn test_array_block_and_type_array() {
        let html = r#"
        <script type="application/ld+json">
        [
            {"@type": "BreadcrumbList", "itemListElement": []},
            {"@type": ["Product", "Thing"],
             "image": [{"@type": "ImageObject", "url": "https://a/1.jpg"}, "https://a/2.jpg"],
             "offers": [{"lowPrice": 450, "highPrice": 900}, {"price": "1"}]}
        ]
        </script>
        "#;

        let meta = extract(html);
        assert_eq!(meta.image.as_deref(), Some("https://a/1.jpg"));
        assert_eq!(meta.price.as_deref(), Some("450"));
    }

    #[test]
    fn test_graph_and_schema_prefix() {
        let html = r#"
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "Organization", "name": "Shop"},
                {"@type": "https://schema.org/Product", "offers": {"highPrice": "2,499"}}
            ]
        }
        </script>
        "#;

        let meta = extract(html);
        assert_eq!(meta.price.as_deref(), Some("2,499"));
        assert_eq!(meta.image, None);
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let html = r#"
        <script type="application/ld+json">{ "@type": "Product", "offers": </script>
        <script type="application/ld+json"></script>
        <script type="application/ld+json">
            {"@type": "Product", "offers": {"price": "120.50"}}
        </script>
        "#;

        let meta = extract(html);
        assert_eq!(meta.price.as_deref(), Some("120.50"));
    }

    #[test]
    fn test_fields_filled_across_blocks() {
        let html = r#"
        <script type="application/ld+json">{"@type": "Product", "image": "https://a/img.jpg"}</script>
        <script type="application/ld+json">{"@type": "Product", "image": "https://a/other.jpg", "offers": {"price": 75}}</script>
        "#;

        let meta = extract(html);
        assert_eq!(meta.image.as_deref(), Some("https://a/img.jpg"));
        assert_eq!(meta.price.as_deref(), Some("75"));
    }

    #[test]
    fn test_existing_fields_are_not_overwritten() {
        let document = Html::parse_document(
            r#"<script type="application/ld+json">{"@type": "Product", "image": "https://a/ld.jpg", "offers": {"price": "5"}}</script>"#,
        );
        let mut meta = PartialMetadata {
            image: Some("https://a/site.jpg".to_string()),
            ..Default::default()
        };
        fill_from_jsonld(&document, &mut meta);
        assert_eq!(meta.image.as_deref(), Some("https://a/site.jpg"));
        assert_eq!(meta.price.as_deref(), Some("5"));
    }

    #[test]
    fn test_non_product_ignored() {
        let html = r#"<script type="application/ld+json">{"@type": "Article", "image": "https://a/x.jpg"}</script>"#;
        assert_eq!(extract(html), PartialMetadata::default());
    }
}
