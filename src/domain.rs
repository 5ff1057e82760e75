//! Domain module - cards, image records and the matching rules between them
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod card;
pub mod constants;
pub mod image_record;
pub mod reconcile;
pub mod search;
pub mod title_parser;

pub use card::{Card, CardData, fallback_card_data};
pub use image_record::{ImageDataDocument, ImageRecord};
pub use reconcile::{CoverageReport, merge, merge_with_report};
pub use search::search_cards;
pub use title_parser::{ParsedTitle, parse_title};
