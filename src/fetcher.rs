//! Page fetching with retries and user-agent rotation

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use url::Url;

use crate::config::{FetchConfig, RetryConfig, DEFAULT_USER_AGENTS};
use crate::error::FetchError;

/// One HTTP GET. Implementations do not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` sending `user_agent`, returning the decoded body.
    async fn get(&self, url: &Url, user_agent: &str) -> Result<String, FetchError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
    max_response_size: usize,
}

impl HttpTransport {
    /// Build the client. An invalid configuration is a `FetchError::Client`.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        config
            .validate()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| FetchError::Client(format!("bad header value `{value}`: {e}")))
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header(&config.accept_language)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        if !config.referer.is_empty() {
            headers.insert(REFERER, header(&config.referer)?);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            max_response_size: config.max_response_size,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, user_agent: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Check content length header first
        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > self.max_response_size {
                return Err(FetchError::BodyTooLarge {
                    size: length,
                    limit: self.max_response_size,
                });
            }
        }

        let body = tokio::time::timeout(self.timeout, response.text())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::Body(e.to_string()))?;

        if body.len() > self.max_response_size {
            return Err(FetchError::BodyTooLarge {
                size: body.len(),
                limit: self.max_response_size,
            });
        }

        Ok(body)
    }
}

/// Retrying fetcher. Attempts are sequential; before retry `k` it waits
/// `k * base_delay`, and every attempt picks a fresh user agent.
#[derive(Debug, Clone)]
pub struct Fetcher<T> {
    transport: T,
    user_agents: Vec<String>,
    retry: RetryConfig,
}

impl Fetcher<HttpTransport> {
    /// Fetcher over a real HTTP client.
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self::new(
            HttpTransport::new(config)?,
            config.user_agents.clone(),
            config.retry.clone(),
        ))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, user_agents: Vec<String>, retry: RetryConfig) -> Self {
        let mut user_agents: Vec<String> = user_agents
            .into_iter()
            .filter(|ua| !ua.trim().is_empty())
            .collect();
        if user_agents.is_empty() {
            user_agents = DEFAULT_USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect();
        }
        Self {
            transport,
            user_agents,
            retry,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch with the configured retry count.
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.fetch_with_retries(url, self.retry.max_retries).await
    }

    /// Fetch making at most `max_retries + 1` attempts.
    pub async fn fetch_with_retries(
        &self,
        url: &Url,
        max_retries: u32,
    ) -> Result<String, FetchError> {
        let attempts = max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt);
                tracing::debug!(%url, attempt, delay_ms = delay.as_millis() as u64, "waiting before retry");
                tokio::time::sleep(delay).await;
            }

            let user_agent = self.pick_user_agent();
            match self.transport.get(url, user_agent).await {
                Ok(body) => {
                    tracing::debug!(%url, attempt, bytes = body.len(), "fetched page");
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(%url, attempt = attempt + 1, of = attempts, error = %e, "fetch attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.unwrap_or(FetchError::Request("no attempt was made".to_string()));
        tracing::error!(%url, attempts, error = %last, "all fetch attempts failed");
        Err(FetchError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        })
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map_or(DEFAULT_USER_AGENTS[0], String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;

    /// Fails the first `failures` calls, then serves a fixed page.
    #[derive(Debug, Clone, Default)]
    struct FlakyTransport {
        failures: usize,
        calls: Arc<Mutex<Vec<(Instant, String)>>>,
    }

    impl FlakyTransport {
        fn failing(failures: usize) -> Self {
            Self {
                failures,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(Instant, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn get(&self, _url: &Url, user_agent: &str) -> Result<String, FetchError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), user_agent.to_string()));
            if calls.len() <= self.failures {
                Err(FetchError::Status(503))
            } else {
                Ok("<html></html>".to_string())
            }
        }
    }

    fn fetcher(transport: FlakyTransport) -> Fetcher<FlakyTransport> {
        Fetcher::new(
            transport,
            vec!["agent-a".to_string(), "agent-b".to_string()],
            RetryConfig::new(2, Duration::from_millis(1000)),
        )
    }

    fn url() -> Url {
        Url::parse("https://shop.example/item/1").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_failures() {
        let transport = FlakyTransport::failing(2);
        let fetcher = fetcher(transport.clone());

        let body = fetcher.fetch(&url()).await.unwrap();
        assert_eq!(body, "<html></html>");

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        // Linear backoff: 1s before the first retry, 2s before the second.
        assert_eq!(calls[1].0 - calls[0].0, Duration::from_millis(1000));
        assert_eq!(calls[2].0 - calls[1].0, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let transport = FlakyTransport::failing(usize::MAX);
        let fetcher = fetcher(transport.clone());

        let err = fetcher.fetch(&url()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::RetriesExhausted { attempts: 3, ref last } if matches!(**last, FetchError::Status(503))
        ));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_is_single_attempt() {
        let transport = FlakyTransport::failing(1);
        let fetcher = fetcher(transport.clone());

        assert!(fetcher.fetch_with_retries(&url(), 0).await.is_err());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_agents_come_from_pool() {
        let transport = FlakyTransport::failing(usize::MAX);
        let fetcher = fetcher(transport.clone());

        let _ = fetcher.fetch(&url()).await;
        for (_, agent) in transport.calls() {
            assert!(agent == "agent-a" || agent == "agent-b", "{agent}");
        }
    }

    #[test]
    fn test_blank_pool_falls_back_to_defaults() {
        let fetcher = Fetcher::new(
            FlakyTransport::default(),
            vec!["  ".to_string()],
            RetryConfig::default(),
        );
        assert!(DEFAULT_USER_AGENTS.contains(&fetcher.pick_user_agent()));
    }

    #[test]
    fn test_invalid_timeouts_are_errors() {
        for seconds in [-1.0, 0.0, f64::NAN, f64::INFINITY, 1e30] {
            let config = FetchConfig::default().with_timeout(seconds);
            assert!(
                matches!(Fetcher::from_config(&config), Err(FetchError::Client(_))),
                "{seconds}"
            );
        }

        let config = FetchConfig {
            connect_timeout_seconds: -5.0,
            ..Default::default()
        };
        assert!(matches!(HttpTransport::new(&config), Err(FetchError::Client(_))));
    }

    #[test]
    fn test_empty_user_agent_pool_is_an_error() {
        let config = FetchConfig {
            user_agents: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(HttpTransport::new(&config), Err(FetchError::Client(_))));
    }

    #[test]
    fn test_http_transport_rejects_bad_header() {
        let config = FetchConfig {
            accept_language: "en\nUS".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(FetchError::Client(_))
        ));
    }
}
