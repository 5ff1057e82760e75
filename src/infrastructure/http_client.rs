//! HTTP client for the spreadsheet and image endpoints
//!
//! Wraps a single `reqwest::Client` with the retry policy shared by every
//! source: retry on network errors and on 408/429/5xx, exponential backoff,
//! `Retry-After` respected when present.

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue, PRAGMA, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, error, info, warn};

use crate::infrastructure::config::HttpConfig;
use crate::infrastructure::fetch_error::{FetchError, FetchResult};

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Attempts per request, including the first
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
    /// Backoff unit; attempt `n` waits `base * 2^(n-1)`
    pub retry_base_delay_ms: u64,
}

impl HttpClientConfig {
    pub fn from_http_config(http: &HttpConfig) -> Self {
        Self {
            timeout_seconds: http.timeout_seconds,
            max_retries: http.max_retries,
            user_agent: http.user_agent.clone(),
            follow_redirects: http.follow_redirects,
            ..Self::default()
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            timeout_seconds: http.timeout_seconds,
            max_retries: http.max_retries,
            user_agent: http.user_agent,
            follow_redirects: true,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Shared HTTP client; cheap to clone.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    /// Optional context label for provenance in logs (e.g., "CardDataSource")
    context_label: Option<String>,
}

impl HttpClient {
    pub fn from_http_config(http: &HttpConfig) -> FetchResult<Self> {
        Self::with_config(HttpClientConfig::from_http_config(http))
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> FetchResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| FetchError::transport("<client>", format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            context_label: None,
        })
    }

    /// Set a human-readable context label for logging provenance
    #[must_use]
    pub fn with_context_label(mut self, label: &str) -> Self {
        self.context_label = Some(label.to_string());
        self
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn label(&self) -> &str {
        self.context_label.as_deref().unwrap_or("http")
    }

    fn no_store_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache, must-revalidate"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.config.retry_base_delay_ms.saturating_mul(factor))
    }

    /// GET with the retry policy; `no_store` adds cache-busting request headers.
    pub async fn fetch_response_with_policy(&self, url: &str, no_store: bool) -> FetchResult<Response> {
        let max_retries = self.config.max_retries.max(1);
        let mut last_err: Option<FetchError> = None;

        for attempt in 1..=max_retries {
            info!("🌐 [{}] HTTP GET (attempt {}/{}): {}", self.label(), attempt, max_retries, url);

            let mut request = self.client.get(url);
            if no_store {
                request = request.headers(Self::no_store_headers());
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }

                    let err = FetchError::from_status(url, status.as_u16());
                    if !err.is_retryable() || attempt == max_retries {
                        error!("❌ [{}] HTTP error {} on attempt {}: {}", self.label(), status, attempt, url);
                        return Err(err);
                    }

                    warn!("⚠️ [{}] HTTP error {} on attempt {}: {}", self.label(), status, attempt, url);
                    let mut delay = self.backoff(attempt);
                    if let Some(retry_after) = resp
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                    {
                        delay = delay.max(Duration::from_secs(retry_after));
                    }
                    tokio::time::sleep(delay).await;
                    last_err = Some(err);
                }
                Err(e) => {
                    let err = FetchError::from_reqwest(url, &e, self.config.timeout_seconds);
                    warn!("⚠️ [{}] Network error on attempt {}: {}", self.label(), attempt, err);
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    last_err = Some(err);
                    if attempt < max_retries {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| FetchError::transport(url, "Unknown HTTP error")))
    }

    /// Fetch a body as text
    pub async fn fetch_text(&self, url: &str) -> FetchResult<String> {
        self.read_text(url, false).await
    }

    /// Fetch a body as text, bypassing any cache on the way
    pub async fn fetch_text_fresh(&self, url: &str) -> FetchResult<String> {
        self.read_text(url, true).await
    }

    async fn read_text(&self, url: &str, no_store: bool) -> FetchResult<String> {
        let response = self.fetch_response_with_policy(url, no_store).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e, self.config.timeout_seconds))?;
        debug!("[{}] Received {} bytes from {}", self.label(), body.len(), url);
        Ok(body)
    }

    /// Fetch a binary body along with its `Content-Type`
    pub async fn fetch_bytes(&self, url: &str) -> FetchResult<(Vec<u8>, Option<String>)> {
        let response = self.fetch_response_with_policy(url, false).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e, self.config.timeout_seconds))?;
        Ok((bytes.to_vec(), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::with_config(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_from_http_config() {
        let http = HttpConfig {
            timeout_seconds: 10,
            max_retries: 2,
            user_agent: "Test Agent".to_string(),
            follow_redirects: false,
        };
        let client = HttpClient::from_http_config(&http).unwrap().with_context_label("test");
        assert_eq!(client.config().timeout_seconds, 10);
        assert_eq!(client.config().max_retries, 2);
        assert!(!client.config().follow_redirects);
    }

    #[test]
    fn test_backoff_doubles() {
        let client = HttpClient::with_config(HttpClientConfig {
            retry_base_delay_ms: 100,
            ..HttpClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.backoff(1), Duration::from_millis(100));
        assert_eq!(client.backoff(3), Duration::from_millis(400));
        assert_eq!(client.backoff(100), Duration::from_millis(u64::MAX));
    }
}
