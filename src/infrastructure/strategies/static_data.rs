use async_trait::async_trait;
use tracing::info;

use super::FetchStrategy;
use crate::domain::{ImageDataDocument, ImageRecord};
use crate::infrastructure::fetch_error::{FetchError, FetchResult};

const BUNDLED_DATA: &str = include_str!("../../../data/static_image_data.json");

/// Records bundled into the binary at build time.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDataStrategy;

impl StaticDataStrategy {
    pub fn bundled_document() -> FetchResult<ImageDataDocument> {
        serde_json::from_str(BUNDLED_DATA).map_err(|e| FetchError::parse("bundled image data", e))
    }
}

#[async_trait]
impl FetchStrategy for StaticDataStrategy {
    fn name(&self) -> &str {
        "Static Data"
    }

    async fn fetch(&self) -> FetchResult<Vec<ImageRecord>> {
        let document = Self::bundled_document()?;
        info!(
            "Loaded {} bundled image records (updated {})",
            document.images.len(),
            document.last_updated.as_deref().unwrap_or("unknown")
        );
        Ok(document.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_title;

    #[tokio::test]
    async fn test_bundled_data_is_non_empty() {
        let records = StaticDataStrategy.fetch().await.unwrap();
        assert!(!records.is_empty());
    }

    #[test]
    fn test_bundled_records_agree_with_title_parser() {
        let document = StaticDataStrategy::bundled_document().unwrap();
        for record in document.images {
            let parsed = parse_title(&record.title);
            assert_eq!(parsed.model_number, record.model_number, "{}", record.title);
            assert_eq!(parsed.character_name, record.character_name, "{}", record.title);
        }
    }
}
