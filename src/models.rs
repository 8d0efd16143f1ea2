//! Request and response types at the extraction boundary.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractError;

/// A request to extract metadata for one product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Parse the URL, accepting only absolute `http`/`https` URLs with a host.
    pub fn validate(&self) -> Result<Url, ExtractError> {
        let raw = self.url.trim();
        let invalid = |reason: &str| ExtractError::InvalidUrl {
            url: self.url.clone(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty"));
        }
        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(&format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        Ok(url)
    }
}

/// Final metadata for one page. Unknown fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    pub title: String,
    pub image: String,
    /// Digits and decimal points only
    pub price: String,
    /// The page URL as the caller sent it, trimmed
    pub url: String,
}

/// The JSON shape returned to callers: metadata or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaResponse {
    Ok(NormalizedMetadata),
    Err { error: String },
}

impl MetaResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl From<Result<NormalizedMetadata, ExtractError>> for MetaResponse {
    fn from(result: Result<NormalizedMetadata, ExtractError>) -> Self {
        match result {
            Ok(meta) => Self::Ok(meta),
            Err(e) => Self::Err {
                error: e.public_message().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_validate_accepts_http_urls() {
        let url = ExtractionRequest::new(" https://www.amazon.in/dp/B09 ")
            .validate()
            .unwrap();
        assert_eq!(url.host_str(), Some("www.amazon.in"));
        assert!(ExtractionRequest::new("http://shop.example/p/1").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        for raw in ["", "   ", "not a url", "/relative/path", "ftp://shop.example/x", "mailto:a@b.c", "https://"] {
            let err = ExtractionRequest::new(raw).validate().unwrap_err();
            assert!(matches!(err, ExtractError::InvalidUrl { .. }), "{raw}");
        }
    }

    #[test]
    fn test_request_from_json() {
        let request: ExtractionRequest =
            serde_json::from_str(r#"{"url": "https://www.zara.com/in/en/p1.html"}"#).unwrap();
        assert_eq!(request.url, "https://www.zara.com/in/en/p1.html");
    }

    #[test]
    fn test_success_shape_has_all_fields() {
        let response = MetaResponse::from(Ok(NormalizedMetadata {
            title: "Lamp".to_string(),
            url: "https://shop.example/lamp".to_string(),
            ..Default::default()
        }));

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "title": "Lamp",
                "image": "",
                "price": "",
                "url": "https://shop.example/lamp"
            })
        );
    }

    #[test]
    fn test_error_shapes() {
        let fetch_failed = MetaResponse::from(Err(ExtractError::Fetch(FetchError::Timeout)));
        assert_eq!(
            serde_json::to_value(&fetch_failed).unwrap(),
            json!({"error": "Failed to fetch page content"})
        );

        let invalid = MetaResponse::from(ExtractionRequest::new("nope").validate().map(|_| {
            NormalizedMetadata::default()
        }));
        assert!(!invalid.is_ok());
        assert_eq!(
            serde_json::to_value(&invalid).unwrap(),
            json!({"error": "A valid product URL is required"})
        );
    }
}
