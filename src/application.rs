//! Application layer module
//!
//! This module contains the use cases that orchestrate the domain logic
//! and the infrastructure sources.

pub mod refresh_service;

pub use refresh_service::{RefreshOutcome, RefreshService};
