use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::FetchStrategy;
use crate::domain::{ImageDataDocument, ImageRecord};
use crate::infrastructure::fetch_error::{FetchError, FetchResult};
use crate::infrastructure::http_client::HttpClient;

/// Pre-generated snapshot served next to the static assets.
#[derive(Debug, Clone)]
pub struct JsonFileStrategy {
    http: HttpClient,
    static_origin: Option<Url>,
    data_path: String,
}

impl JsonFileStrategy {
    pub fn new(http: HttpClient, static_origin: Option<Url>, data_path: impl Into<String>) -> Self {
        Self {
            http,
            static_origin,
            data_path: data_path.into(),
        }
    }

    /// Snapshot URL, when a static origin is available
    pub fn data_url(&self) -> Option<FetchResult<Url>> {
        self.static_origin.as_ref().map(|origin| {
            origin
                .join(&self.data_path)
                .map_err(|e| FetchError::parse("snapshot URL", e))
        })
    }

    /// Validate and decode a snapshot body.
    pub fn parse_document(body: &str) -> FetchResult<ImageDataDocument> {
        let value: Value = serde_json::from_str(body).map_err(|e| FetchError::parse("image snapshot", e))?;
        if !value.get("images").is_some_and(Value::is_array) {
            return Err(FetchError::invalid_structure("snapshot has no `images` array"));
        }
        serde_json::from_value(value).map_err(|e| FetchError::invalid_structure(e.to_string()))
    }
}

#[async_trait]
impl FetchStrategy for JsonFileStrategy {
    fn name(&self) -> &str {
        "JSON File"
    }

    async fn fetch(&self) -> FetchResult<Vec<ImageRecord>> {
        let Some(url) = self.data_url() else {
            debug!("No static origin configured; skipping JSON snapshot");
            return Ok(Vec::new());
        };
        let url = url?;

        let body = self.http.fetch_text_fresh(url.as_str()).await?;
        let document = Self::parse_document(&body)?;
        info!(
            "Loaded {} image records from {} (updated {})",
            document.images.len(),
            url,
            document.last_updated.as_deref().unwrap_or("unknown")
        );
        Ok(document.images)
    }
}
