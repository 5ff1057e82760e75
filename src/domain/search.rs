use super::card::{Card, CardData};

/// Find cards whose model number starts with `query` or whose title
/// contains it, ignoring ASCII case.
///
/// Results follow price-key order, then list order. An empty query matches
/// nothing.
pub fn search_cards<'a>(data: &'a CardData, query: &str) -> Vec<&'a Card> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_ascii_lowercase();

    data.cards()
        .filter(|card| {
            card.model_number.to_ascii_lowercase().starts_with(&needle)
                || card.title.to_ascii_lowercase().contains(&needle)
        })
        .collect()
}
