//! Fetch-with-fallback over the image sources
//!
//! Sources are tried in order; the first non-empty result wins. Failures are
//! logged and never leave this module.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::ImageRecord;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::image_store::ImageStore;
use crate::infrastructure::image_url::ImageUrlTransformer;
use crate::infrastructure::strategies::network_monitor::CaptureTimings;
use crate::infrastructure::strategies::{
    ExecutionContext, FetchStrategy, HtmlParseStrategy, JsonFileStrategy, NetworkMonitorStrategy,
    SampleDataStrategy, StaticDataStrategy,
};

/// Which source is asked first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyOrder {
    /// Static, JSON, HTML, sample
    #[default]
    StaticFirst,
    /// HTML, JSON, static, sample
    SpreadsheetFirst,
    /// Network capture, HTML, static, sample
    NetworkMonitorFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Static,
    JsonFile,
    HtmlParse,
    NetworkMonitor,
    Sample,
}

impl StrategyOrder {
    pub fn kinds(self) -> [StrategyKind; 4] {
        use StrategyKind::{HtmlParse, JsonFile, NetworkMonitor, Sample, Static};
        match self {
            Self::StaticFirst => [Static, JsonFile, HtmlParse, Sample],
            Self::SpreadsheetFirst => [HtmlParse, JsonFile, Static, Sample],
            Self::NetworkMonitorFirst => [NetworkMonitor, HtmlParse, Static, Sample],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StaticFirst => "static-first",
            Self::SpreadsheetFirst => "spreadsheet-first",
            Self::NetworkMonitorFirst => "network-monitor-first",
        }
    }
}

impl fmt::Display for StrategyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "static-first" | "default" => Ok(Self::StaticFirst),
            "spreadsheet-first" => Ok(Self::SpreadsheetFirst),
            "network-monitor-first" => Ok(Self::NetworkMonitorFirst),
            other => Err(format!("unknown strategy order: {other}")),
        }
    }
}

/// Result of a fetch-with-fallback run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub records: Vec<ImageRecord>,
    /// Name of the source that supplied `records`
    pub source: Option<String>,
    /// Sources asked, including the successful one
    pub attempts: usize,
}

pub struct ImageDataFetcher {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl ImageDataFetcher {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the configured source order for `context`.
    pub fn from_config(config: &AppConfig, http: &HttpClient, context: &ExecutionContext) -> Self {
        let transformer = ImageUrlTransformer::from_setting(&config.fetch.image_size);
        let strategies = config
            .fetch
            .strategy_order
            .kinds()
            .into_iter()
            .map(|kind| -> Box<dyn FetchStrategy> {
                match kind {
                    StrategyKind::Static => Box::new(StaticDataStrategy),
                    StrategyKind::Sample => Box::new(SampleDataStrategy),
                    StrategyKind::JsonFile => Box::new(JsonFileStrategy::new(
                        http.clone(),
                        context.snapshot_origin(),
                        config.sources.json_data_path.clone(),
                    )),
                    StrategyKind::HtmlParse => Box::new(HtmlParseStrategy::new(
                        http.clone(),
                        config.sources.published_sheet_url.clone(),
                        config.sources.sheets.clone(),
                        transformer,
                        Duration::from_millis(config.fetch.sheet_request_delay_ms),
                    )),
                    StrategyKind::NetworkMonitor => Box::new(NetworkMonitorStrategy::new(
                        context.clone(),
                        http.clone(),
                        ImageStore::new(config.fetch.image_store_dir.clone()),
                        config.sources.published_sheet_url.clone(),
                        config.sources.sheets.clone(),
                        CaptureTimings {
                            navigation_timeout: Duration::from_secs(config.fetch.navigation_timeout_seconds),
                            settle: Duration::from_secs(config.fetch.settle_wait_seconds),
                            sheet_delay: Duration::from_millis(config.fetch.browser_sheet_delay_ms),
                        },
                    )),
                }
            })
            .collect();
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each source in order and return the first non-empty result.
    pub async fn fetch_with_fallback(&self) -> FetchOutcome {
        let mut attempts = 0;
        for strategy in &self.strategies {
            attempts += 1;
            info!("Trying image source: {}", strategy.name());
            match strategy.fetch().await {
                Ok(records) if !records.is_empty() => {
                    info!("✅ {} returned {} image records", strategy.name(), records.len());
                    return FetchOutcome {
                        records,
                        source: Some(strategy.name().to_string()),
                        attempts,
                    };
                }
                Ok(_) => info!("{} returned no records", strategy.name()),
                Err(e) => warn!("⚠️ {} failed: {}", strategy.name(), e),
            }
        }

        warn!("All image sources failed or returned nothing");
        FetchOutcome {
            records: Vec::new(),
            source: None,
            attempts,
        }
    }
}
