use serde::{Deserialize, Serialize};

use super::title_parser::parse_title;

/// An image row scraped from an image sheet or loaded from a bundled table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default)]
    pub model_number: String,
}

impl ImageRecord {
    /// Build a record from a raw title, deriving name and model number.
    pub fn from_title(title: impl Into<String>, image_url: impl Into<String>) -> Self {
        let title = title.into();
        let parsed = parse_title(&title);
        Self {
            title,
            image_url: image_url.into(),
            character_name: parsed.character_name,
            model_number: parsed.model_number,
        }
    }
}

/// JSON snapshot of image records, as served from `/data/imageData.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDataDocument {
    pub images: Vec<ImageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ImageDataDocument {
    pub fn new(images: Vec<ImageRecord>) -> Self {
        Self {
            images,
            last_updated: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}
