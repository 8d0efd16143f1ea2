//! Error types for metadata extraction.
//!
//! Only [`ExtractError`] crosses the public extraction boundary. [`ParseError`]
//! is produced by individual data sources and always recovered inside the
//! pipeline.

use std::path::PathBuf;

/// Failure to retrieve a page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("response body of {size} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { size: usize, limit: usize },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// Failure to interpret one embedded data source (JSON-LD block, script blob).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unparseable script: {0}")]
    Script(String),

    #[error("no script assigns `{0}`")]
    VariableNotFound(String),
}

/// Failure of a whole extraction request.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ExtractError {
    /// Short message suitable for showing to an end user.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "A valid product URL is required",
            Self::Fetch(_) => "Failed to fetch page content",
        }
    }
}

/// Invalid extractor configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule `{rule}` has an invalid selector `{selector}`")]
    InvalidSelector { rule: String, selector: String },

    #[error("{0}")]
    Invalid(String),
}
