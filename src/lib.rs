//! specfetch - product catalog crawler for specification sheets.
//!
//! Walks a vendor's category pages, discovers product pages, expands the
//! interaction-gated "Specifications" panel on each one and downloads the
//! verified spec-sheet PDF into a category-structured directory.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod services;
pub mod utils;

pub use config::Settings;
pub use error::{Result, ScrapeError};
