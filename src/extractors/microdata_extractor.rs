//! Microdata (schema.org HTML attributes) extraction
//!
//! Reads `price` and `image` properties of a `Product` item declared with
//! itemscope/itemtype/itemprop attributes.
//! Reference: https://html.spec.whatwg.org/multipage/microdata.html

use scraper::{ElementRef, Html, Selector};

use super::PartialMetadata;

/// Fill the empty price/image fields of `meta` from microdata `Product` items
pub fn fill_from_microdata(document: &Html, meta: &mut PartialMetadata) {
    let (Ok(product_selector), Ok(prop_selector)) = (
        Selector::parse(r#"[itemscope][itemtype$="/Product"]"#),
        Selector::parse("[itemprop]"),
    ) else {
        return;
    };

    for product in document.select(&product_selector) {
        if meta.has_price_and_image() {
            break;
        }

        for prop_element in product.select(&prop_selector) {
            match prop_element.value().attr("itemprop") {
                Some("image") if meta.image.is_none() => {
                    meta.offer_image(property_value(&prop_element).as_deref());
                }
                Some("price") if meta.price.is_none() => {
                    meta.offer_price(property_value(&prop_element).as_deref());
                }
                _ => {}
            }
        }
    }
}

/// Property value as defined per element type by the microdata model
fn property_value(element: &ElementRef) -> Option<String> {
    let el = element.value();
    let value = match el.name() {
        "meta" => el.attr("content").map(String::from),
        "link" | "a" | "area" => el.attr("href").map(String::from),
        "img" | "audio" | "video" | "source" => el.attr("src").map(String::from),
        "data" | "meter" => el.attr("value").map(String::from),
        // Many shops put the machine-readable price in `content` on a span.
        _ => el
            .attr("content")
            .map(String::from)
            .or_else(|| Some(element.text().collect::<String>())),
    };
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
