//! Published-sheet HTML scraping
//!
//! Each image sheet is published as an HTML table. Cell 2 of a row carries
//! the product title and cell 4 the image, either as an `<img>` element or
//! as the text of an `=IMAGE("...")` formula.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::FetchStrategy;
use crate::domain::ImageRecord;
use crate::domain::constants::image_sheet::{HEADER_KEYWORDS, IMAGE_CELL_INDEX, TITLE_CELL_INDEX};
use crate::infrastructure::config::SheetSource;
use crate::infrastructure::fetch_error::FetchResult;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::image_url::ImageUrlTransformer;

lazy_static! {
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref CELL: Selector = Selector::parse("td").unwrap();
    static ref IMG: Selector = Selector::parse("img[src]").unwrap();
    static ref IMAGE_FORMULA: Regex = Regex::new(r#"(?i)=IMAGE\(\s*"([^"]+)""#).unwrap();
    static ref BARE_URL: Regex = Regex::new(r#"https?://[^\s"'<>)]+"#).unwrap();
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Image URL of a cell: `<img src>` first, then formula text.
fn cell_image_url(cell: &ElementRef<'_>) -> Option<String> {
    if let Some(src) = cell.select(&IMG).find_map(|img| img.value().attr("src")) {
        let src = src.trim();
        if !src.is_empty() {
            return Some(src.to_string());
        }
    }

    let text = cell_text(cell);
    IMAGE_FORMULA
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .or_else(|| BARE_URL.find(&text))
        .map(|m| m.as_str().to_string())
}

/// Header and label rows carry one of the known column captions.
pub fn is_data_title(title: &str) -> bool {
    !title.is_empty() && !HEADER_KEYWORDS.iter().any(|kw| title.contains(kw))
}

/// Extract image records from one published sheet.
pub fn parse_sheet_html(html: &str, transformer: &ImageUrlTransformer) -> Vec<ImageRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for row in document.select(&ROW) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
        if cells.len() <= IMAGE_CELL_INDEX {
            continue;
        }

        let title = cell_text(&cells[TITLE_CELL_INDEX]);
        if !is_data_title(&title) {
            continue;
        }

        let Some(image_url) = cell_image_url(&cells[IMAGE_CELL_INDEX]) else {
            debug!("No image in row: {}", title);
            continue;
        };

        records.push(ImageRecord::from_title(title, transformer.apply(&image_url)));
    }

    records
}

/// Scrapes every configured image sheet over plain HTTP.
#[derive(Debug, Clone)]
pub struct HtmlParseStrategy {
    http: HttpClient,
    published_sheet_url: String,
    sheets: Vec<SheetSource>,
    transformer: ImageUrlTransformer,
    sheet_delay: Duration,
}

impl HtmlParseStrategy {
    pub fn new(
        http: HttpClient,
        published_sheet_url: impl Into<String>,
        sheets: Vec<SheetSource>,
        transformer: ImageUrlTransformer,
        sheet_delay: Duration,
    ) -> Self {
        Self {
            http,
            published_sheet_url: published_sheet_url.into(),
            sheets,
            transformer,
            sheet_delay,
        }
    }
}

#[async_trait]
impl FetchStrategy for HtmlParseStrategy {
    fn name(&self) -> &str {
        "HTML Parse"
    }

    async fn fetch(&self) -> FetchResult<Vec<ImageRecord>> {
        let mut all_records = Vec::new();

        for (index, sheet) in self.sheets.iter().enumerate() {
            if index > 0 && !self.sheet_delay.is_zero() {
                tokio::time::sleep(self.sheet_delay).await;
            }

            let url = sheet.url(&self.published_sheet_url);
            let html = match self.http.fetch_text(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Sheet {} ({}) failed: {}", sheet.gid, sheet.category, e);
                    continue;
                }
            };

            let records = parse_sheet_html(&html, &self.transformer);
            info!("Sheet {} ({}): {} image records", sheet.gid, sheet.category, records.len());
            all_records.extend(records);
        }

        info!("Parsed {} image records from {} sheets", all_records.len(), self.sheets.len());
        Ok(all_records)
    }
}
