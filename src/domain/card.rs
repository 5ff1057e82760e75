use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::constants::{image::NO_IMAGE_URL, price_list::MINIMUM_GUARANTEE_PRICE};

/// A buy-price row from the price list.
///
/// Field names on the wire match the keys the storefront UI reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "cardId")]
    pub card_id: String,
    #[serde(rename = "商品タイトル")]
    pub title: String,
    #[serde(rename = "商品型番")]
    pub model_number: String,
    #[serde(rename = "レアリティ")]
    pub rarity: String,
    #[serde(rename = "買取価格")]
    pub price: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

impl Card {
    /// Build a card from the four price-list columns.
    ///
    /// The id is `"{model_number}-{title}"` with every `/` replaced by `-`,
    /// so it can be used as a path segment or map key.
    pub fn new(
        title: impl Into<String>,
        model_number: impl Into<String>,
        rarity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let model_number = model_number.into();
        Self {
            card_id: Self::derive_id(&model_number, &title),
            title,
            model_number,
            rarity: rarity.into(),
            price: price.into(),
            image_url: NO_IMAGE_URL.to_string(),
        }
    }

    pub fn derive_id(model_number: &str, title: &str) -> String {
        format!("{model_number}-{title}").replace('/', "-")
    }

    /// Return a copy pointing at another image.
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty() && self.image_url != NO_IMAGE_URL
    }

    /// Parse the yen amount out of a price like `"¥1,200"`.
    ///
    /// Returns `None` for the minimum-guarantee sentinel or any other
    /// non-numeric price.
    pub fn price_value(&self) -> Option<u64> {
        let price = self.price.trim();
        if price.is_empty() || price == MINIMUM_GUARANTEE_PRICE {
            return None;
        }
        let digits: String = price
            .chars()
            .filter(|c| !matches!(c, '¥' | '￥' | ','))
            .collect();
        digits.trim().parse().ok()
    }
}

/// Cards bucketed by their raw price string.
///
/// Every card in a bucket has `price` equal to the bucket key. Keys are kept
/// sorted for stable output only; consumers that care about presentation
/// order sort on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardData(BTreeMap<String, Vec<Card>>);

impl CardData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a card to the bucket named by its price.
    pub fn push(&mut self, card: Card) {
        self.0.entry(card.price.clone()).or_default().push(card);
    }

    pub fn get(&self, price_key: &str) -> Option<&[Card]> {
        self.0.get(price_key).map(Vec::as_slice)
    }

    pub fn price_keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[Card])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All cards, bucket by bucket.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.0.values().flatten()
    }

    /// Number of cards across all buckets.
    pub fn card_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Rebuild the mapping with `f` applied to every card, keeping bucket
    /// and list order.
    #[must_use]
    pub fn map_cards<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Card) -> Card,
    {
        Self(
            self.0
                .iter()
                .map(|(key, cards)| (key.clone(), cards.iter().map(&mut f).collect()))
                .collect(),
        )
    }
}

impl FromIterator<Card> for CardData {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut data = Self::new();
        for card in iter {
            data.push(card);
        }
        data
    }
}

/// Built-in cards shown when the price list cannot be loaded.
pub fn fallback_card_data() -> CardData {
    [
        Card {
            card_id: "sample-100-001".to_string(),
            ..Card::new("サンプルカード1", "100/001", "AR", "100")
        },
        Card {
            card_id: "sample-200-001".to_string(),
            ..Card::new("サンプルカード2", "200/001", "SR", "200")
        },
        Card {
            card_id: "sample-min-001".to_string(),
            ..Card::new("サンプルカード（最低保証）", "MIN/001", "N", MINIMUM_GUARANTEE_PRICE)
        },
    ]
    .into_iter()
    .collect()
}
