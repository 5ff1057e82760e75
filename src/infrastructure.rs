//! Infrastructure layer for HTTP access, spreadsheet parsing and local storage
//!
//! This module provides the HTTP client, the price list and image sources,
//! configuration and logging.

pub mod browser;
pub mod card_source;
pub mod config; // Layered configuration
pub mod fetch_error;
pub mod http_client;
pub mod image_fetcher;
pub mod image_store;
pub mod image_url;
pub mod logging; // Logging infrastructure
pub mod strategies;

// Re-export commonly used items
pub use browser::{BrowserDriver, BrowserSession, HttpResourceDriver, ObservedResponse};
pub use card_source::{CardDataSource, parse_csv};
pub use config::{AppConfig, ConfigError, LoggingConfig};
pub use fetch_error::{FetchError, FetchResult};
pub use http_client::{HttpClient, HttpClientConfig};
pub use image_fetcher::{FetchOutcome, ImageDataFetcher, StrategyOrder};
pub use image_store::ImageStore;
pub use image_url::{ImageUrlTransformer, SizeConfig, SizePreset, transform_url};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use strategies::{ExecutionContext, FetchStrategy};
