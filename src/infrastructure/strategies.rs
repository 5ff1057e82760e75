//! Image data sources
//!
//! Each source implements [`FetchStrategy`]; the fetcher tries them in a
//! configured order. What a source may do depends on the
//! [`ExecutionContext`] it was built with, never on where the code runs.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::domain::ImageRecord;
use crate::infrastructure::browser::BrowserDriver;
use crate::infrastructure::fetch_error::FetchResult;

pub mod html_parse;
pub mod json_file;
pub mod network_monitor;
pub mod sample_data;
pub mod static_data;

pub use html_parse::HtmlParseStrategy;
pub use json_file::JsonFileStrategy;
pub use network_monitor::NetworkMonitorStrategy;
pub use sample_data::SampleDataStrategy;
pub use static_data::StaticDataStrategy;

#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// ログ・結果表示用の名前
    fn name(&self) -> &str;

    /// 画像レコードを取得
    async fn fetch(&self) -> FetchResult<Vec<ImageRecord>>;
}

/// Capabilities available to the image sources.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    /// Browser runtime for network capture; absent on plain servers
    pub browser: Option<Arc<dyn BrowserDriver>>,
    /// Origin serving static assets such as the JSON snapshot
    pub static_origin: Option<Url>,
}

impl ExecutionContext {
    /// No browser runtime and no static origin.
    pub fn server() -> Self {
        Self::default()
    }

    pub fn browser(driver: Arc<dyn BrowserDriver>, static_origin: Option<Url>) -> Self {
        Self {
            browser: Some(driver),
            static_origin,
        }
    }

    pub fn has_browser(&self) -> bool {
        self.browser.is_some()
    }

    /// Origin for the JSON snapshot; only a browser context serves one.
    pub fn snapshot_origin(&self) -> Option<Url> {
        if self.has_browser() {
            self.static_origin.clone()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("browser", &self.browser.is_some())
            .field("static_origin", &self.static_origin.as_ref().map(Url::as_str))
            .finish()
    }
}
