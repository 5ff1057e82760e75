//! Title normalisation for price-list and image-sheet rows.
//!
//! Titles look like `【状態A】ロケット団のヘルガー AR SV10 100/098`: optional
//! condition tags, a character name, a rarity token and a trailing
//! `set-code number/total` model number.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref CONDITION_TAG: Regex = Regex::new(r"【[^】]*】").unwrap();
    static ref TRAILING_MODEL_NUMBER: Regex =
        Regex::new(r"[a-zA-Z0-9-]+\s+\d{1,3}/\d{1,3}$").unwrap();
    static ref LEADING_NAME: Regex =
        Regex::new(r"^(\S+[\u{3041}-\u{309F}\u{30A1}-\u{30FC}]*)").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTitle {
    pub character_name: String,
    pub model_number: String,
}

/// Remove every `【...】` tag and trim.
pub fn strip_condition_tags(title: &str) -> String {
    CONDITION_TAG.replace_all(title, "").trim().to_string()
}

/// Trailing model number of an already cleaned title, if any.
pub fn extract_model_number(cleaned: &str) -> Option<&str> {
    TRAILING_MODEL_NUMBER
        .find(cleaned.trim_end())
        .map(|m| m.as_str().trim())
}

/// Split a raw title into character name and model number.
///
/// Never fails; unparseable input yields empty fields.
pub fn parse_title(raw: &str) -> ParsedTitle {
    let cleaned = strip_condition_tags(raw);
    if cleaned.is_empty() {
        return ParsedTitle::default();
    }

    if let Some(m) = TRAILING_MODEL_NUMBER.find(&cleaned) {
        let before = cleaned[..m.start()].trim();
        let character_name = LEADING_NAME
            .captures(before)
            .and_then(|caps| caps.get(1))
            .map(|name| name.as_str().to_string())
            .unwrap_or_default();
        return ParsedTitle {
            character_name,
            model_number: m.as_str().trim().to_string(),
        };
    }

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let character_name = tokens.first().map(|t| (*t).to_string()).unwrap_or_default();
    let model_number = if tokens.len() >= 3 {
        tokens[tokens.len() - 2..].join(" ")
    } else {
        String::new()
    };

    ParsedTitle {
        character_name,
        model_number,
    }
}
