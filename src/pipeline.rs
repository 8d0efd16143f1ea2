//! Extraction pipeline
//!
//! Site rule, then structured data, then generic fallback. Each stage only
//! fills fields the earlier ones left empty. The price is normalized and the
//! image resolved against the page URL at the end.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use scraper::Html;
use tracing::instrument;
use url::Url;

use crate::config::ExtractorConfig;
use crate::error::{ConfigError, ExtractError};
use crate::extractors::{fill_from_generic, fill_from_structured_data, PartialMetadata};
use crate::fetcher::{Fetcher, HttpTransport, Transport};
use crate::models::{ExtractionRequest, NormalizedMetadata};
use crate::normalize::normalize_price;
use crate::sites::{builtin_rules, SiteRegistry};

/// Fetches product pages and extracts their metadata.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
#[derive(Debug, Clone)]
pub struct MetadataExtractor<T = HttpTransport> {
    fetcher: Fetcher<T>,
    registry: Arc<SiteRegistry>,
}

impl MetadataExtractor<HttpTransport> {
    /// Extractor with default settings and the built-in site rules.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(&ExtractorConfig::default())
    }

    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fetcher = Fetcher::from_config(&config.fetch)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self::with_parts(fetcher, registry_for(config)?))
    }
}

/// Configured rules first, so they take precedence over the built-in ones.
pub fn registry_for(config: &ExtractorConfig) -> Result<SiteRegistry, ConfigError> {
    let mut registry = SiteRegistry::new();
    registry.register_rules(config.sites.iter().cloned())?;
    registry.register_rules(builtin_rules())?;
    Ok(registry)
}

impl<T: Transport> MetadataExtractor<T> {
    pub fn with_parts(fetcher: Fetcher<T>, registry: SiteRegistry) -> Self {
        Self {
            fetcher,
            registry: Arc::new(registry),
        }
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Fetch `url` and extract its metadata.
    ///
    /// Invalid URLs are rejected before any request is made. Missing fields
    /// are not errors; they come back as empty strings.
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> Result<NormalizedMetadata, ExtractError> {
        self.extract_request(&ExtractionRequest::new(url)).await
    }

    pub async fn extract_request(
        &self,
        request: &ExtractionRequest,
    ) -> Result<NormalizedMetadata, ExtractError> {
        let page_url = request.validate()?;
        let html = self.fetcher.fetch(&page_url).await?;
        let mut meta = extract_from_html(&self.registry, &page_url, &html);
        // Echo the URL as sent.
        meta.url = request.url.trim().to_string();
        Ok(meta)
    }

    /// Extract several URLs with at most `concurrency` in flight. Results
    /// keep the input order.
    pub async fn extract_many<I, S>(
        &self,
        urls: I,
        concurrency: usize,
    ) -> Vec<Result<NormalizedMetadata, ExtractError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        stream::iter(urls)
            .map(|url| async move { self.extract(url.as_ref()).await })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Run every extraction stage over an already fetched page. The `url`
/// field is `page_url` as serialized by the `url` crate.
pub fn extract_from_html(registry: &SiteRegistry, page_url: &Url, html: &str) -> NormalizedMetadata {
    let document = Html::parse_document(html);
    let mut meta = PartialMetadata::default();

    if let Some(strategy) = page_url.host_str().and_then(|host| registry.select(host)) {
        meta = strategy.extract(&document);
        tracing::debug!(site = strategy.name(), ?meta, "site rule applied");
    }

    if !meta.has_price_and_image() {
        fill_from_structured_data(&document, &mut meta);
        tracing::debug!(?meta, "after structured data");
    }

    if !meta.is_complete() {
        fill_from_generic(&document, &mut meta);
        tracing::debug!(?meta, "after generic fallback");
    }

    NormalizedMetadata {
        title: meta.title.unwrap_or_default(),
        image: meta
            .image
            .map(|image| resolve_image(page_url, &image))
            .unwrap_or_default(),
        price: meta
            .price
            .as_deref()
            .and_then(normalize_price)
            .unwrap_or_default(),
        url: page_url.to_string(),
    }
}

/// Make relative and protocol-relative sources absolute. Values that do not
/// resolve are returned unchanged.
fn resolve_image(page_url: &Url, image: &str) -> String {
    page_url
        .join(image)
        .map(String::from)
        .unwrap_or_else(|_| image.to_string())
}
