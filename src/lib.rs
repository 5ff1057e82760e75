//! card-buyback - trading card buy price search
//!
//! Loads the buy-price list and the card image sheets, matches every price row
//! to an image and hands the merged data to the storefront and invoice tools.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{RefreshOutcome, RefreshService};
pub use domain::{Card, CardData, ImageRecord};
