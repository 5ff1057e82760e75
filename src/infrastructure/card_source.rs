//! Price list loader
//!
//! The price list is a spreadsheet exported as CSV: one title row, one
//! column-label row, then `title, model number, rarity, price, ...` rows.

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, error, info, warn};

use crate::domain::constants::price_list::{EXPECTED_HEADER_LABELS, HEADER_ROWS, MIN_COLUMNS};
use crate::domain::{Card, CardData};
use crate::infrastructure::fetch_error::FetchResult;
use crate::infrastructure::http_client::HttpClient;

/// Whether `record` carries the expected column labels.
pub fn is_expected_header(record: &StringRecord) -> bool {
    EXPECTED_HEADER_LABELS
        .iter()
        .enumerate()
        .all(|(i, label)| record.get(i).is_some_and(|cell| cell.trim() == *label))
}

/// Parse price-list CSV text into cards bucketed by price.
///
/// Exactly [`HEADER_ROWS`] rows are skipped. Rows with fewer than four
/// columns, blank rows and undecodable rows are dropped.
pub fn parse_csv(text: &str) -> CardData {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut data = CardData::new();
    let mut skipped = 0usize;

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Undecodable CSV row {}: {}", index, e);
                skipped += 1;
                continue;
            }
        };

        if index < HEADER_ROWS {
            if index == HEADER_ROWS - 1 && !is_expected_header(&record) {
                warn!(
                    "Unexpected price list header row: {:?} (expected {:?})",
                    record.iter().take(MIN_COLUMNS).collect::<Vec<_>>(),
                    EXPECTED_HEADER_LABELS
                );
            }
            continue;
        }

        if record.len() < MIN_COLUMNS {
            skipped += 1;
            continue;
        }

        let cell = |i: usize| record.get(i).unwrap_or_default().trim();
        if cell(0).is_empty() && cell(1).is_empty() {
            skipped += 1;
            continue;
        }

        data.push(Card::new(cell(0), cell(1), cell(2), cell(3)));
    }

    debug!("Parsed {} cards ({} rows skipped)", data.card_count(), skipped);
    data
}

/// Loads the price list from its CSV export.
#[derive(Debug, Clone)]
pub struct CardDataSource {
    http: HttpClient,
    csv_url: String,
}

impl CardDataSource {
    pub fn new(http: HttpClient, csv_url: impl Into<String>) -> Self {
        Self {
            http,
            csv_url: csv_url.into(),
        }
    }

    pub async fn try_fetch_card_data(&self) -> FetchResult<CardData> {
        let text = self.http.fetch_text_fresh(&self.csv_url).await?;
        Ok(parse_csv(&text))
    }

    /// Fetch the price list; any failure yields an empty mapping.
    pub async fn fetch_card_data(&self) -> CardData {
        match self.try_fetch_card_data().await {
            Ok(data) => {
                info!(
                    "Loaded {} cards in {} price tiers",
                    data.card_count(),
                    data.price_keys().count()
                );
                data
            }
            Err(e) => {
                error!("Failed to load price list from {}: {}", self.csv_url, e);
                CardData::new()
            }
        }
    }
}
