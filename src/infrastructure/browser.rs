//! Browser capability used by the network-capture image source
//!
//! A driver launches sessions; a session loads a page and reports the
//! responses it observed. Sessions are owned by a single fetch and closed
//! before it returns.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};
use url::Url;

use crate::infrastructure::fetch_error::{FetchError, FetchResult};
use crate::infrastructure::http_client::HttpClient;

/// A completed response seen while a page loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

impl ObservedResponse {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image/"))
    }

    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url).ok()?.host_str().map(str::to_string)
    }
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// 新しいブラウザセッションを開始
    async fn launch(&self) -> FetchResult<Box<dyn BrowserSession>>;
}

#[async_trait]
pub trait BrowserSession: Send {
    /// ページを開き、完了したレスポンスを収集
    ///
    /// `navigation_timeout` bounds the page load; `settle` bounds the wait
    /// for late sub-resources after it.
    async fn capture_responses(
        &mut self,
        url: &str,
        navigation_timeout: Duration,
        settle: Duration,
    ) -> FetchResult<Vec<ObservedResponse>>;

    /// セッションを終了
    async fn close(self: Box<Self>) -> FetchResult<()>;
}

/// Non-scripting driver: fetches the page over HTTP, then requests every
/// `<img>` it references and reports each response.
#[derive(Debug, Clone)]
pub struct HttpResourceDriver {
    http: HttpClient,
}

impl HttpResourceDriver {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BrowserDriver for HttpResourceDriver {
    async fn launch(&self) -> FetchResult<Box<dyn BrowserSession>> {
        debug!("Launching HTTP resource session");
        Ok(Box::new(HttpResourceSession {
            http: self.http.clone(),
            pages_loaded: 0,
        }))
    }
}

struct HttpResourceSession {
    http: HttpClient,
    pages_loaded: usize,
}

/// Absolute URLs of every `<img src>` in a document, in document order.
pub fn image_sources(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| base.join(src.trim()).ok())
        .map(String::from)
        .collect()
}

#[async_trait]
impl BrowserSession for HttpResourceSession {
    async fn capture_responses(
        &mut self,
        url: &str,
        navigation_timeout: Duration,
        settle: Duration,
    ) -> FetchResult<Vec<ObservedResponse>> {
        let base = Url::parse(url).map_err(|e| FetchError::browser(format!("Invalid page URL {url}: {e}")))?;

        let page = timeout(navigation_timeout, self.http.fetch_text(url))
            .await
            .map_err(|_| FetchError::Timeout {
                seconds: navigation_timeout.as_secs(),
                url: url.to_string(),
            })??;
        self.pages_loaded += 1;

        let sources = image_sources(&page, &base);
        info!("Page loaded: {} ({} image resources)", url, sources.len());

        let deadline = Instant::now() + settle;
        let mut observed = Vec::with_capacity(sources.len());
        for src in sources {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Settle wait elapsed; {} resources observed", observed.len());
                break;
            }
            match timeout(remaining, self.http.fetch_response_with_policy(&src, false)).await {
                Ok(Ok(resp)) => observed.push(ObservedResponse {
                    url: src,
                    status: resp.status().as_u16(),
                    content_type: resp
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                }),
                Ok(Err(FetchError::HttpStatus { status, .. })) => observed.push(ObservedResponse {
                    url: src,
                    status,
                    content_type: None,
                }),
                Ok(Err(FetchError::NotFound { .. })) => observed.push(ObservedResponse {
                    url: src,
                    status: 404,
                    content_type: None,
                }),
                Ok(Err(e)) => debug!("Resource failed {}: {}", src, e),
                Err(_) => {
                    warn!("Settle wait elapsed while loading {}", src);
                    break;
                }
            }
        }

        Ok(observed)
    }

    async fn close(self: Box<Self>) -> FetchResult<()> {
        debug!("Closing HTTP resource session after {} pages", self.pages_loaded);
        Ok(())
    }
}
