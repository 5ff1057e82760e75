use async_trait::async_trait;
use tracing::info;

use super::FetchStrategy;
use crate::domain::ImageRecord;
use crate::infrastructure::fetch_error::FetchResult;

/// Last-resort records; always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleDataStrategy;

impl SampleDataStrategy {
    pub fn records() -> Vec<ImageRecord> {
        [
            ("ピカチュウ", "sv11b 100/086", "/images/sv11b-100-086.jpg"),
            ("リザードン", "sv11b 101/086", "/images/sv11b-101-086.jpg"),
            ("フシギバナ", "sv11b 102/086", "/images/sv11b-102-086.jpg"),
            ("イーブイ", "sv11w 101/086", "/images/sv11w-101-086.jpg"),
        ]
        .into_iter()
        .map(|(name, model, url)| ImageRecord {
            title: format!("{name} {model}"),
            image_url: url.to_string(),
            character_name: name.to_string(),
            model_number: model.to_string(),
        })
        .collect()
    }
}

#[async_trait]
impl FetchStrategy for SampleDataStrategy {
    fn name(&self) -> &str {
        "Sample Data"
    }

    async fn fetch(&self) -> FetchResult<Vec<ImageRecord>> {
        info!("Using sample image data");
        Ok(Self::records())
    }
}
