//! Network-capture image source
//!
//! Loads each sheet in a browser session, keeps the CDN image responses it
//! observed, downloads them once each and stores them content-addressed.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{ExecutionContext, FetchStrategy};
use crate::domain::ImageRecord;
use crate::domain::constants::image::CAPTURE_HOST;
use crate::infrastructure::browser::{BrowserSession, ObservedResponse};
use crate::infrastructure::config::SheetSource;
use crate::infrastructure::fetch_error::FetchResult;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::image_store::ImageStore;
use crate::infrastructure::image_url::strip_size_suffix;

#[derive(Debug, Clone, Copy)]
pub struct CaptureTimings {
    pub navigation_timeout: Duration,
    pub settle: Duration,
    pub sheet_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct NetworkMonitorStrategy {
    context: ExecutionContext,
    http: HttpClient,
    store: ImageStore,
    published_sheet_url: String,
    sheets: Vec<SheetSource>,
    timings: CaptureTimings,
    capture_host: String,
}

impl NetworkMonitorStrategy {
    pub fn new(
        context: ExecutionContext,
        http: HttpClient,
        store: ImageStore,
        published_sheet_url: impl Into<String>,
        sheets: Vec<SheetSource>,
        timings: CaptureTimings,
    ) -> Self {
        Self {
            context,
            http,
            store,
            published_sheet_url: published_sheet_url.into(),
            sheets,
            timings,
            capture_host: CAPTURE_HOST.to_string(),
        }
    }

    /// Accept images from another host
    #[must_use]
    pub fn with_capture_host(mut self, host: impl Into<String>) -> Self {
        self.capture_host = host.into();
        self
    }

    fn is_wanted(&self, response: &ObservedResponse) -> bool {
        response.status == 200
            && response.is_image()
            && response.host().as_deref() == Some(self.capture_host.as_str())
    }

    async fn capture_sheets(&self, session: &mut dyn BrowserSession) -> Vec<ImageRecord> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        for (index, sheet) in self.sheets.iter().enumerate() {
            if index > 0 && !self.timings.sheet_delay.is_zero() {
                tokio::time::sleep(self.timings.sheet_delay).await;
            }

            let url = sheet.url(&self.published_sheet_url);
            let responses = match session
                .capture_responses(&url, self.timings.navigation_timeout, self.timings.settle)
                .await
            {
                Ok(responses) => responses,
                Err(e) => {
                    warn!("Capture failed for sheet {} ({}): {}", sheet.gid, sheet.category, e);
                    continue;
                }
            };

            let mut saved = 0;
            for response in responses.iter().filter(|r| self.is_wanted(r)) {
                let canonical = strip_size_suffix(&response.url);
                if !seen.insert(canonical.clone()) {
                    continue;
                }
                if let Some(record) = self.save_image(&sheet.category, &response.url, &canonical).await {
                    records.push(record);
                    saved += 1;
                }
            }
            info!("Sheet {} ({}): {} images saved", sheet.gid, sheet.category, saved);
        }

        records
    }

    async fn save_image(&self, category: &str, url: &str, canonical: &str) -> Option<ImageRecord> {
        let (bytes, content_type) = match self.http.fetch_bytes(url).await {
            Ok(download) => download,
            Err(e) => {
                warn!("Image download failed {}: {}", url, e);
                return None;
            }
        };

        match self.store.save(category, canonical, content_type.as_deref(), &bytes).await {
            Ok(stored) => {
                debug!("Saved {} -> {}", url, stored.path.display());
                Some(ImageRecord {
                    title: format!("{} Card {}", category.to_uppercase(), stored.short_hash),
                    image_url: stored.public_url,
                    character_name: String::new(),
                    model_number: String::new(),
                })
            }
            Err(e) => {
                warn!("Image store write failed for {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl FetchStrategy for NetworkMonitorStrategy {
    fn name(&self) -> &str {
        "Network Monitor"
    }

    async fn fetch(&self) -> FetchResult<Vec<ImageRecord>> {
        let Some(driver) = self.context.browser.clone() else {
            info!("No browser runtime in this context; skipping network capture");
            return Ok(Vec::new());
        };

        let mut session = driver.launch().await?;
        let records = self.capture_sheets(session.as_mut()).await;
        if let Err(e) = session.close().await {
            warn!("Browser session did not close cleanly: {}", e);
        }

        info!("Network capture produced {} image records", records.len());
        Ok(records)
    }
}
