//! Price-row to image-row matching.
//!
//! There is no key shared between the two sheets, so each card is matched by
//! the model number in its title, then disambiguated by character name. A card
//! with any candidate always gets one; only cards with no candidate keep the
//! placeholder image.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::card::{Card, CardData};
use super::constants::image::NO_IMAGE_URL;
use super::image_record::ImageRecord;
use super::title_parser::{extract_model_number, parse_title, strip_condition_tags};

/// Merge outcome counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub total_cards: usize,
    pub with_image: usize,
    pub without_image: usize,
    pub unmatched_titles: Vec<String>,
}

impl CoverageReport {
    pub fn from_card_data(data: &CardData) -> Self {
        let mut report = Self::default();
        for card in data.cards() {
            report.total_cards += 1;
            if card.has_image() {
                report.with_image += 1;
            } else {
                report.without_image += 1;
                report.unmatched_titles.push(card.title.clone());
            }
        }
        report
    }

    /// Share of cards that received an image, in `0.0..=1.0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_cards == 0 {
            return 0.0;
        }
        self.with_image as f64 / self.total_cards as f64
    }
}

/// Case-insensitive, whitespace-collapsed form used for model number equality.
pub fn normalize_model_number(model_number: &str) -> String {
    model_number
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Pick the image for one card, if any record qualifies.
pub fn match_image<'a>(card: &Card, images: &'a [ImageRecord]) -> Option<&'a ImageRecord> {
    let cleaned = strip_condition_tags(&card.title);
    let candidate = normalize_model_number(extract_model_number(&cleaned)?);

    let matches: Vec<&ImageRecord> = images
        .iter()
        .filter(|record| {
            !record.model_number.is_empty()
                && normalize_model_number(&record.model_number) == candidate
        })
        .collect();

    match matches.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, ..] => {
            let card_name = parse_title(&cleaned).character_name;
            matches
                .iter()
                .find(|record| !card_name.is_empty() && record.character_name == card_name)
                .or_else(|| {
                    matches.iter().find(|record| {
                        !record.character_name.is_empty()
                            && (cleaned.contains(record.character_name.as_str())
                                || (!card_name.is_empty()
                                    && record.character_name.contains(card_name.as_str())))
                    })
                })
                .copied()
                .or(Some(*first))
        }
    }
}

/// Assign an image to every card, returning a new mapping.
///
/// Bucket keys and card order are preserved; every card ends with a non-empty
/// `image_url`.
pub fn merge(cards: &CardData, images: &[ImageRecord]) -> CardData {
    cards.map_cards(|card| {
        let image_url = match match_image(card, images) {
            Some(record) if !record.image_url.is_empty() => record.image_url.clone(),
            _ => {
                debug!("No image for card: {}", card.title);
                NO_IMAGE_URL.to_string()
            }
        };
        card.clone().with_image_url(image_url)
    })
}

/// Merge and report coverage in one pass over the result.
pub fn merge_with_report(cards: &CardData, images: &[ImageRecord]) -> (CardData, CoverageReport) {
    let merged = merge(cards, images);
    let report = CoverageReport::from_card_data(&merged);
    (merged, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, model: &str, url: &str) -> ImageRecord {
        ImageRecord {
            title: format!("{name} {model}"),
            image_url: url.to_string(),
            character_name: name.to_string(),
            model_number: model.to_string(),
        }
    }

    fn data(cards: Vec<Card>) -> CardData {
        cards.into_iter().collect()
    }

    #[test]
    fn test_no_model_number_gets_placeholder() {
        let cards = data(vec![Card::new("ピカチュウ プロモ", "PROMO", "P", "100")]);
        let images = vec![record("ピカチュウ", "sv11b 100/086", "/a.jpg")];

        let merged = merge(&cards, &images);
        let card = &merged.get("100").unwrap()[0];
        assert_eq!(card.image_url, NO_IMAGE_URL);
    }

    #[test]
    fn test_single_candidate_is_used() {
        let cards = data(vec![Card::new("【状態A】ピカチュウ AR sv11b 100/086", "100/086", "AR", "1200")]);
        let images = vec![
            record("リザードン", "sv11b 101/086", "/b.jpg"),
            record("別名", "SV11B  100/086", "/a.jpg"),
        ];

        let merged = merge(&cards, &images);
        assert_eq!(merged.get("1200").unwrap()[0].image_url, "/a.jpg");
    }

    #[test]
    fn test_exact_name_wins_among_candidates() {
        let cards = data(vec![Card::new("リザードン SAR sv11b 100/086", "100/086", "SAR", "5000")]);
        let images = vec![
            record("ピカチュウ", "sv11b 100/086", "/pika.jpg"),
            record("リザードン", "sv11b 100/086", "/zard.jpg"),
        ];

        let merged = merge(&cards, &images);
        assert_eq!(merged.get("5000").unwrap()[0].image_url, "/zard.jpg");
    }

    #[test]
    fn test_substring_name_then_first_candidate() {
        let cards = data(vec![Card::new("ロケット団のヘルガー AR SV10 100/098", "100/098", "AR", "800")]);
        let images = vec![
            record("ピカチュウ", "SV10 100/098", "/pika.jpg"),
            record("ヘルガー", "SV10 100/098", "/hel.jpg"),
        ];
        let merged = merge(&cards, &images);
        assert_eq!(merged.get("800").unwrap()[0].image_url, "/hel.jpg");

        let images = vec![
            record("ピカチュウ", "SV10 100/098", "/pika.jpg"),
            record("ミュウ", "SV10 100/098", "/mew.jpg"),
        ];
        let merged = merge(&cards, &images);
        assert_eq!(merged.get("800").unwrap()[0].image_url, "/pika.jpg");
    }

    #[test]
    fn test_merge_keeps_input_untouched_and_reports() {
        let cards = data(vec![
            Card::new("ピカチュウ AR sv11b 100/086", "100/086", "AR", "100"),
            Card::new("ミュウ SR", "SR", "SR", "100"),
        ]);
        let images = vec![record("ピカチュウ", "sv11b 100/086", "/a.jpg")];

        let (merged, report) = merge_with_report(&cards, &images);
        assert!(cards.cards().all(|c| c.image_url == NO_IMAGE_URL));
        assert!(merged.cards().all(|c| !c.image_url.is_empty()));
        assert_eq!(report.total_cards, 2);
        assert_eq!(report.with_image, 1);
        assert_eq!(report.without_image, 1);
        assert_eq!(report.unmatched_titles, vec!["ミュウ SR".to_string()]);
        assert!((report.coverage_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_model_number() {
        assert_eq!(normalize_model_number(" SV11B   100/086 "), "sv11b 100/086");
    }
}
