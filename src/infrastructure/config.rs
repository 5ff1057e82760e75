//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional config file (JSON or TOML, `--config` or the user config dir)
//! 3. `CARDBUY_` environment variables, `__` between nested keys
//!    (e.g. `CARDBUY_FETCH__IMAGE_SIZE=LARGE`)

#![allow(clippy::uninlined_format_args)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::infrastructure::image_fetcher::StrategyOrder;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Invalid configuration value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Failed to locate user config directory")]
    NoConfigDir,
}

impl ConfigError {
    fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub http: HttpConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
}

/// Where card prices and images come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// CSV export of the price list
    pub card_csv_url: String,

    /// Published-HTML endpoint of the image workbook (without query)
    pub published_sheet_url: String,

    /// Image sheets, in the order they are scraped
    pub sheets: Vec<SheetSource>,

    /// Path of the image snapshot relative to the static origin
    pub json_data_path: String,

    /// Origin serving static assets; required by the JSON snapshot source
    #[serde(default)]
    pub static_origin: Option<String>,
}

/// One sheet (tab) of the image workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSource {
    pub gid: String,
    /// Rarity category, used as the directory name for captured images
    pub category: String,
}

impl SheetSource {
    pub fn new(gid: &str, category: &str) -> Self {
        Self {
            gid: gid.to_string(),
            category: category.to_string(),
        }
    }

    /// Published-HTML URL of this sheet
    pub fn url(&self, published_sheet_url: &str) -> String {
        format!("{}?gid={}&single=true", published_sheet_url, self.gid)
    }
}

/// HTTP client behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Attempts per request, including the first
    pub max_retries: u32,
    pub user_agent: String,
    pub follow_redirects: bool,
}

/// Image fetch behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub strategy_order: StrategyOrder,

    /// Size preset name (`THUMBNAIL` .. `ORIGINAL`) or pixel size
    pub image_size: String,

    /// Delay between published-sheet requests
    pub sheet_request_delay_ms: u64,

    /// Delay between sheets in a browser session
    pub browser_sheet_delay_ms: u64,

    pub navigation_timeout_seconds: u64,

    /// Time to wait after navigation for late image responses
    pub settle_wait_seconds: u64,

    /// Root of the content-addressed image store
    pub image_store_dir: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    pub file_name: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    #[serde(default)]
    pub module_filters: HashMap<String, String>,
}

/// Default values
pub mod defaults {
    /// Published image workbook id
    pub const PUBLISHED_SHEET_ID: &str =
        "2PACX-1vRHvYoYFzk-sIRNJL3qf-uyxGQg2BFv0dJ147oHC11UPY0Ob1ovEvz3j6GVc-tOQvGY6nIvev1QXF9o";

    /// Price list spreadsheet id
    pub const PRICE_SHEET_ID: &str = "1XhLcAypoY18yQiUWpd0T-9fNpAd3dCf2NEPVRy3iW1E";

    /// Price list tab
    pub const PRICE_SHEET_NAME: &str = "ALLData";

    /// Image sheets as (gid, category)
    pub const SHEETS: &[(&str, &str)] = &[
        ("615803266", "ar"),
        ("831083568", "sr"),
        ("1856522830", "sar"),
        ("209255296", "ur"),
        ("696239385", "chr"),
        ("811385213", "rr"),
        ("978855825", "rr"),
        ("1429605223", "rr"),
        ("1002981119", "rr"),
    ];

    pub const JSON_DATA_PATH: &str = "/data/imageData.json";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default attempts per request
    pub const MAX_RETRIES: u32 = 3;
    pub const MAX_RETRIES_LIMIT: u32 = 10;

    pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; card-buyback/0.1)";

    pub const IMAGE_SIZE: &str = "MEDIUM";

    pub const SHEET_REQUEST_DELAY_MS: u64 = 500;

    pub const BROWSER_SHEET_DELAY_MS: u64 = 1000;

    pub const NAVIGATION_TIMEOUT_SECONDS: u64 = 60;

    pub const SETTLE_WAIT_SECONDS: u64 = 5;

    pub const IMAGE_STORE_DIR: &str = "public/images";

    pub const LOG_FILE_NAME: &str = "card-buyback.log";

    pub const MAX_LOG_FILES: u32 = 10;

    pub fn card_csv_url() -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&sheet={}",
            PRICE_SHEET_ID, PRICE_SHEET_NAME
        )
    }

    pub fn published_sheet_url() -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/e/{}/pubhtml",
            PUBLISHED_SHEET_ID
        )
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            card_csv_url: defaults::card_csv_url(),
            published_sheet_url: defaults::published_sheet_url(),
            sheets: defaults::SHEETS
                .iter()
                .map(|(gid, category)| SheetSource::new(gid, category))
                .collect(),
            json_data_path: defaults::JSON_DATA_PATH.to_string(),
            static_origin: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            strategy_order: StrategyOrder::default(),
            image_size: defaults::IMAGE_SIZE.to_string(),
            sheet_request_delay_ms: defaults::SHEET_REQUEST_DELAY_MS,
            browser_sheet_delay_ms: defaults::BROWSER_SHEET_DELAY_MS,
            navigation_timeout_seconds: defaults::NAVIGATION_TIMEOUT_SECONDS,
            settle_wait_seconds: defaults::SETTLE_WAIT_SECONDS,
            image_store_dir: PathBuf::from(defaults::IMAGE_STORE_DIR),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::MAX_LOG_FILES,
            auto_cleanup_logs: true,
            module_filters: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Default config file location: `<user config dir>/card-buyback/config.json`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("card-buyback").join("config.json"))
    }

    /// Load defaults, then the file at `path` (if it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_config_path().ok(),
        };

        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path.as_deref() {
            debug!("Config file candidate: {:?}", path);
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("CARDBUY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!(
            "Configuration loaded (strategy order: {}, image size: {})",
            config.fetch.strategy_order, config.fetch.image_size
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.sources.card_csv_url)
            .map_err(|e| ConfigError::validation("sources.card_csv_url", e.to_string()))?;
        Url::parse(&self.sources.published_sheet_url)
            .map_err(|e| ConfigError::validation("sources.published_sheet_url", e.to_string()))?;

        if self.sources.sheets.is_empty() {
            return Err(ConfigError::validation("sources.sheets", "at least one sheet is required"));
        }

        if let Some(origin) = &self.sources.static_origin {
            Url::parse(origin)
                .map_err(|e| ConfigError::validation("sources.static_origin", e.to_string()))?;
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::validation("http.timeout_seconds", "must be greater than 0"));
        }

        if self.http.max_retries == 0 || self.http.max_retries > defaults::MAX_RETRIES_LIMIT {
            return Err(ConfigError::validation(
                "http.max_retries",
                format!("must be between 1 and {}", defaults::MAX_RETRIES_LIMIT),
            ));
        }

        if self.fetch.navigation_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "fetch.navigation_timeout_seconds",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Parsed static origin, if configured
    pub fn static_origin(&self) -> Option<Url> {
        self.sources
            .static_origin
            .as_deref()
            .and_then(|origin| Url::parse(origin).ok())
    }
}
