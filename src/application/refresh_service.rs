//! Refresh use case: load prices and images together and merge them
//!
//! Both loads run concurrently. Neither can fail past this point: an empty
//! price list is replaced by the built-in sample cards, and missing images
//! leave cards on the placeholder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{CardData, CoverageReport, ImageRecord, fallback_card_data, merge_with_report};
use crate::infrastructure::image_fetcher::{FetchOutcome, ImageDataFetcher};
use crate::infrastructure::{AppConfig, CardDataSource, ExecutionContext, FetchResult, HttpClient};

/// Result of one refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// False when the price list could not be loaded
    pub success: bool,
    pub data: CardData,
    /// Image source that supplied the records, if any
    pub image_source: Option<String>,
    pub used_fallback_cards: bool,
    pub coverage: CoverageReport,
    pub timestamp: DateTime<Utc>,
}

pub struct RefreshService {
    card_source: Arc<CardDataSource>,
    image_fetcher: Arc<ImageDataFetcher>,
}

impl RefreshService {
    pub fn new(card_source: CardDataSource, image_fetcher: ImageDataFetcher) -> Self {
        Self {
            card_source: Arc::new(card_source),
            image_fetcher: Arc::new(image_fetcher),
        }
    }

    /// Wire the sources described by `config` for `context`.
    pub fn from_config(config: &AppConfig, context: &ExecutionContext) -> FetchResult<Self> {
        let http = HttpClient::from_http_config(&config.http)?;
        let card_source = CardDataSource::new(
            http.clone().with_context_label("CardDataSource"),
            config.sources.card_csv_url.clone(),
        );
        let image_fetcher =
            ImageDataFetcher::from_config(config, &http.with_context_label("ImageDataFetcher"), context);
        Ok(Self::new(card_source, image_fetcher))
    }

    /// Image records only, via the configured fallback order.
    pub async fn fetch_images(&self) -> FetchOutcome {
        self.image_fetcher.fetch_with_fallback().await
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        info!("Refreshing card data");
        let (cards, images) = tokio::join!(
            self.card_source.fetch_card_data(),
            self.image_fetcher.fetch_with_fallback()
        );

        Self::assemble(cards, images)
    }

    fn assemble(cards: CardData, images: FetchOutcome) -> RefreshOutcome {
        let used_fallback_cards = cards.is_empty();
        let cards = if used_fallback_cards {
            warn!("Price list is empty; using sample cards");
            fallback_card_data()
        } else {
            cards
        };

        let records: &[ImageRecord] = &images.records;
        let (data, coverage) = merge_with_report(&cards, records);

        info!(
            "Refresh complete: {} cards, {} with images ({:.0}%), image source: {}",
            coverage.total_cards,
            coverage.with_image,
            coverage.coverage_ratio() * 100.0,
            images.source.as_deref().unwrap_or("none")
        );
        if coverage.without_image > 0 {
            warn!("{} cards have no image", coverage.without_image);
        }

        RefreshOutcome {
            success: !used_fallback_cards,
            data,
            image_source: images.source,
            used_fallback_cards,
            coverage,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Card;
    use crate::domain::constants::image::NO_IMAGE_URL;

    #[test]
    fn test_assemble_uses_fallback_cards_when_price_list_empty() {
        let outcome = RefreshService::assemble(CardData::new(), FetchOutcome::default());
        assert!(!outcome.success);
        assert!(outcome.used_fallback_cards);
        assert_eq!(outcome.data.card_count(), 3);
        assert!(outcome.data.cards().all(|c| c.image_url == NO_IMAGE_URL));
        assert_eq!(outcome.image_source, None);
    }

    #[test]
    fn test_assemble_merges_images() {
        let cards: CardData = vec![Card::new("ピカチュウ AR sv11b 100/086", "100/086", "AR", "1200")]
            .into_iter()
            .collect();
        let images = FetchOutcome {
            records: vec![ImageRecord::from_title("ピカチュウ sv11b 100/086", "/pika.jpg")],
            source: Some("Static Data".to_string()),
            attempts: 1,
        };

        let outcome = RefreshService::assemble(cards, images);
        assert!(outcome.success);
        assert!(!outcome.used_fallback_cards);
        assert_eq!(outcome.data.get("1200").unwrap()[0].image_url, "/pika.jpg");
        assert_eq!(outcome.coverage.with_image, 1);
        assert_eq!(outcome.image_source.as_deref(), Some("Static Data"));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["usedFallbackCards"], false);
        assert_eq!(json["data"]["1200"][0]["imageUrl"], "/pika.jpg");
    }
}
