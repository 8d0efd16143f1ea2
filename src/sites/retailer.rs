//! Declarative retailer rules
//!
//! A [`SelectorRule`] lists CSS selectors per field in priority order, plus
//! optional inline state lookups for shops that render from an inline state blob.
//! Rules deserialize from configuration and compile into a
//! [`RetailerStrategy`].

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use super::SiteStrategy;
use crate::error::ConfigError;
use crate::extractors::{
    find_script_variable, first_attr, first_text, first_text_of, json_scalar_text,
    PartialMetadata,
};

/// Where to find an image: a selector, or a `[selector, attribute]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSelector {
    /// Read `src` of the first match, e.g. `"#landingImage"`
    Css(String),
    /// Read the named attribute, e.g. `["img.zoom", "data-src"]`
    CssAttr(String, String),
}

impl ImageSelector {
    fn parts(&self) -> (&str, &str) {
        match self {
            Self::Css(css) => (css, "src"),
            Self::CssAttr(css, attr) => (css, attr),
        }
    }
}

/// A global variable holding page state, and JSON pointers into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptState {
    /// Variable name as assigned in the script (`__myx`, not `window.__myx`)
    pub variable: String,
    /// RFC 6901 pointers tried in order for the price
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
}

impl ScriptState {
    pub fn new(variable: &str, price: &[&str], image: &[&str]) -> Self {
        Self {
            variable: variable.to_string(),
            price: price.iter().map(|p| (*p).to_string()).collect(),
            image: image.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Configuration form of a retailer rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRule {
    /// Name used in logs
    pub name: String,
    /// Hostname substrings this rule applies to
    pub domains: Vec<String>,
    /// Price selectors; element text is read
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub image: Vec<ImageSelector>,
    #[serde(default)]
    pub title: Vec<String>,
    /// Consulted for fields the selectors did not find
    #[serde(default)]
    pub scripts: Vec<ScriptState>,
}

/// A compiled [`SelectorRule`].
#[derive(Debug, Clone)]
pub struct RetailerStrategy {
    name: String,
    price: Vec<Selector>,
    image: Vec<(Selector, String)>,
    title: Vec<Selector>,
    scripts: Vec<ScriptState>,
}

impl RetailerStrategy {
    /// Compile every selector up front so bad configuration fails at load.
    pub fn compile(rule: SelectorRule) -> Result<Self, ConfigError> {
        let compile = |css: &str| {
            Selector::parse(css).map_err(|_| ConfigError::InvalidSelector {
                rule: rule.name.clone(),
                selector: css.to_string(),
            })
        };

        let price = rule
            .price
            .iter()
            .map(|css| compile(css))
            .collect::<Result<Vec<_>, _>>()?;
        let title = rule
            .title
            .iter()
            .map(|css| compile(css))
            .collect::<Result<Vec<_>, _>>()?;
        let image = rule
            .image
            .iter()
            .map(|selector| {
                let (css, attr) = selector.parts();
                compile(css).map(|selector| (selector, attr.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: rule.name,
            price,
            image,
            title,
            scripts: rule.scripts,
        })
    }

    fn fill_from_scripts(&self, document: &Html, meta: &mut PartialMetadata) {
        for script in &self.scripts {
            if meta.has_price_and_image() {
                return;
            }

            let state = match find_script_variable(document, &script.variable) {
                Ok(state) => state,
                Err(e) => {
                    // Missing or broken blob: nothing to read.
                    tracing::debug!(site = %self.name, variable = %script.variable, error = %e, "script state unavailable");
                    continue;
                }
            };

            let lookup = |pointers: &[String]| {
                pointers
                    .iter()
                    .find_map(|ptr| state.pointer(ptr).and_then(json_scalar_text))
            };

            if meta.price.is_none() {
                meta.offer_price(lookup(&script.price).as_deref());
            }
            if meta.image.is_none() {
                meta.offer_image(lookup(&script.image).as_deref());
            }
        }
    }
}

impl SiteStrategy for RetailerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html) -> PartialMetadata {
        let mut meta = PartialMetadata::default();

        // A label without digits ("Sold out") does not end the search.
        for selector in &self.price {
            meta.offer_price(first_text(document, selector).as_deref());
        }

        meta.offer_image(
            self.image
                .iter()
                .find_map(|(selector, attr)| first_attr(document, selector, attr))
                .as_deref(),
        );

        meta.offer_title(first_text_of(document, &self.title).as_deref());

        if !meta.has_price_and_image() {
            self.fill_from_scripts(document, &mut meta);
        }

        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> SelectorRule {
        SelectorRule {
            name: "shop".to_string(),
            domains: vec!["shop.example".to_string()],
            price: vec![".stock-label".to_string(), ".deal-price".to_string()],
            image: vec![
                ImageSelector::Css("#missing".to_string()),
                ImageSelector::CssAttr("img.zoom".to_string(), "data-src".to_string()),
            ],
            title: vec!["h1.product-title".to_string()],
            scripts: vec![ScriptState::new(
                "__STATE__",
                &["/product/price"],
                &["/product/images/0"],
            )],
        }
    }

    #[test]
    fn test_selectors_in_priority_order() {
        let html = r#"
        <html><body>
            <h1 class="product-title"> Wool Scarf </h1>
            <span class="stock-label">Sold out</span>
            <span class="deal-price">₹799</span>
            <img class="zoom" src="/thumb.jpg" data-src="https://cdn.shop/scarf-large.jpg">
        </body></html>
        "#;

        let strategy = RetailerStrategy::compile(rule()).unwrap();
        let meta = strategy.extract(&Html::parse_document(html));

        assert_eq!(meta.price.as_deref(), Some("₹799"));
        assert_eq!(meta.image.as_deref(), Some("https://cdn.shop/scarf-large.jpg"));
        assert_eq!(meta.title.as_deref(), Some("Wool Scarf"));
    }

    #[test]
    fn test_script_state_fills_gaps() {
        let html = r#"
        <html><body>
            <span class="deal-price">₹799</span>
            <script>window.__STATE__ = {"product": {"price": 999, "images": ["https://cdn.shop/1.jpg"]}};</script>
        </body></html>
        "#;

        let strategy = RetailerStrategy::compile(rule()).unwrap();
        let meta = strategy.extract(&Html::parse_document(html));

        assert_eq!(meta.price.as_deref(), Some("₹799"));
        assert_eq!(meta.image.as_deref(), Some("https://cdn.shop/1.jpg"));
    }

    #[test]
    fn test_broken_script_blob_is_ignored() {
        let html = r#"<script>window.__STATE__ = {"product": ;</script>"#;
        let strategy = RetailerStrategy::compile(rule()).unwrap();
        assert_eq!(
            strategy.extract(&Html::parse_document(html)),
            PartialMetadata::default()
        );
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut bad = rule();
        bad.price.push("div[".to_string());
        let err = RetailerStrategy::compile(bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { ref selector, .. } if selector == "div["));
    }

    #[test]
    fn test_rule_from_json() {
        let json = r#"{
            "name": "boutique",
            "domains": ["boutique.example"],
            "price": [".price"],
            "image": ["img.hero", ["img.lazy", "data-original"]]
        }"#;

        let rule: SelectorRule = serde_json::from_str(json).unwrap();
        assert_eq!(
            rule.image,
            vec![
                ImageSelector::Css("img.hero".to_string()),
                ImageSelector::CssAttr("img.lazy".to_string(), "data-original".to_string()),
            ]
        );
        assert!(rule.scripts.is_empty());
    }
}
