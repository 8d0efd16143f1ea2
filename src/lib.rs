//! Product metadata extraction for wishlist links
//!
//! Given a product page URL, fetches the page and returns its title, main
//! image and price as plain strings. Sources, in priority order:
//! - Per-retailer CSS selector rules and inline script state
//! - JSON-LD and microdata (schema.org `Product`)
//! - Meta tags (OpenGraph, Twitter Card) and an `<img>` scan
//!
//! Fields nothing could find come back as empty strings.

pub mod config;
pub mod error;
pub mod extractors;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sites;

pub use config::{ExtractorConfig, FetchConfig, RetryConfig};
pub use error::{ConfigError, ExtractError, FetchError, ParseError};
pub use fetcher::{Fetcher, HttpTransport, Transport};
pub use models::{ExtractionRequest, MetaResponse, NormalizedMetadata};
pub use normalize::normalize_price;
pub use pipeline::{extract_from_html, MetadataExtractor};
pub use sites::{SiteRegistry, SiteStrategy};
