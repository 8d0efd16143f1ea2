//! Built-in retailer rules, in match order.

use super::{ImageSelector, ScriptState, SelectorRule};

fn rule(name: &str, domains: &[&str], price: &[&str], image: &[&str]) -> SelectorRule {
    SelectorRule {
        name: name.to_string(),
        domains: domains.iter().map(|d| (*d).to_string()).collect(),
        price: price.iter().map(|p| (*p).to_string()).collect(),
        image: image
            .iter()
            .map(|css| ImageSelector::Css((*css).to_string()))
            .collect(),
        title: Vec::new(),
        scripts: Vec::new(),
    }
}

/// Rules for the retailers wishlists link to most.
pub fn builtin_rules() -> Vec<SelectorRule> {
    let mut amazon = rule(
        "amazon",
        &["amazon"],
        &[
            ".a-price:not(.a-text-price) .a-offscreen",
            ".a-price-whole",
            "#priceblock_ourprice",
            "#priceblock_dealprice",
        ],
        &[
            "#landingImage",
            "#imgBlkFront",
            "#main-image",
            ".a-dynamic-image",
            ".a-button-text img",
        ],
    );
    amazon.title.push("#productTitle".to_string());

    let mut myntra = rule("myntra", &["myntra"], &[], &[]);
    myntra.scripts = vec![
        ScriptState::new(
            "__myx",
            &["/pdpData/price/discounted", "/pdpData/price/mrp"],
            &["/pdpData/media/albums/0/images/0/src"],
        ),
        // Older pages assign the product object directly; some wrap it once more.
        ScriptState::new(
            "pdpData",
            &[
                "/price/discounted",
                "/price/mrp",
                "/pdpData/price/discounted",
                "/pdpData/price/mrp",
            ],
            &[
                "/media/albums/0/images/0/src",
                "/pdpData/media/albums/0/images/0/src",
            ],
        ),
    ];

    let mut ajio = rule("ajio", &["ajio"], &[], &[]);
    ajio.scripts = vec![ScriptState::new(
        "__PRELOADED_STATE__",
        &[
            "/product/productDetails/price/value",
            "/product/productDetails/wasPriceData/value",
        ],
        &["/product/productDetails/images/0/url"],
    )];

    vec![
        amazon,
        rule(
            "flipkart",
            &["flipkart"],
            &[r#"div[class*="_30jeq3"]"#],
            &[r#"img[class*="_396cs4"]"#],
        ),
        myntra,
        ajio,
        rule(
            "meesho",
            &["meesho"],
            &[r#"h4[class*="Price__CurrentPrice"]"#],
            &[r#"img[class*="ProductImage"]"#],
        ),
        rule(
            "hm",
            &["hm.com"],
            &[
                "#product-price .price-value",
                ".product-item-price",
                "span.price-value",
            ],
            &[
                ".product-detail-main-image-container img",
                ".product-detail-main-image img",
                "figure.pdp-image img",
            ],
        ),
        rule(
            "zara",
            &["zara"],
            &[".price__amount", ".product-detail-info__price-amount"],
            &[".media-image__image", ".product-detail-images__image"],
        ),
        rule(
            "savana",
            &["savana", "urbanic"],
            &[".product-price", r#"div[class*="price"]"#],
            &[".product-image", r#"img[class*="gallery"]"#],
        ),
    ]
}
