//! Product-link extraction configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::models::ExtractionStrategy;
use crate::scrapers::browser::Locator;

use super::model_code::DEFAULT_PREFIXES;

/// Settings for [`ProductLinkExtractor`](super::ProductLinkExtractor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Strategies to run, in order. Results are merged, never short-circuited.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<ExtractionStrategy>,

    /// Model-code prefixes (`FD`, `RD`, ...).
    #[serde(default = "default_prefixes")]
    pub model_prefixes: Vec<String>,

    /// Path segment under `/products/` that every product link shares.
    #[serde(default = "default_taxonomy_root")]
    pub taxonomy_root: String,

    /// Containers carrying product-identity attributes.
    #[serde(default = "default_container_selector")]
    pub container_selector: String,

    /// Attributes read for a model code, in order.
    #[serde(default = "default_model_attributes")]
    pub model_attributes: Vec<String>,

    /// Product grid card.
    #[serde(default = "default_card_selector")]
    pub card_selector: String,

    /// Link inside a card.
    #[serde(default = "default_card_link_selector")]
    pub card_link_selector: String,

    /// Heading inside a card, holding the model code.
    #[serde(default = "default_card_heading_selector")]
    pub card_heading_selector: String,

    /// Description paragraph inside a card.
    #[serde(default = "default_card_description_selector")]
    pub card_description_selector: String,

    /// Inline structured-data blocks.
    #[serde(default = "default_embedded_data_selector")]
    pub embedded_data_selector: String,

    /// Links containing any of these are listing pages, not products.
    #[serde(default = "default_excluded_path_markers")]
    pub excluded_path_markers: Vec<String>,

    /// Links ending in one of these slugs are category pages.
    #[serde(default = "default_category_slugs")]
    pub category_slugs: Vec<String>,

    /// Page-size dropdown to widen the product grid before extracting.
    #[serde(default = "default_page_size")]
    pub page_size: Option<PageSizeControl>,

    /// How deep subcategory links are followed.
    #[serde(default = "default_max_subcategory_depth")]
    pub max_subcategory_depth: usize,

    /// Upper bound on pages rendered for one category.
    #[serde(default = "default_max_category_pages")]
    pub max_category_pages: usize,
}

/// A `<select>` controlling how many products a listing shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSizeControl {
    pub locator: Locator,
    pub value: String,
    #[serde(default = "default_page_size_wait_ms")]
    pub wait_ms: u64,
    #[serde(default = "default_page_size_settle_ms")]
    pub settle_ms: u64,
}

fn default_strategies() -> Vec<ExtractionStrategy> {
    vec![
        ExtractionStrategy::Containers,
        ExtractionStrategy::ProductCards,
        ExtractionStrategy::UrlPattern,
        ExtractionStrategy::EmbeddedData,
        ExtractionStrategy::FullText,
    ]
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_taxonomy_root() -> String {
    "drainage-solutions".to_string()
}

fn default_container_selector() -> String {
    "[data-model-number], [data-product-id], [data-item-number]".to_string()
}

fn default_model_attributes() -> Vec<String> {
    ["data-model-number", "data-product-id", "data-item-number", "id"]
        .iter()
        .map(|a| a.to_string())
        .collect()
}

fn default_card_selector() -> String {
    ".grid-item".to_string()
}

fn default_card_link_selector() -> String {
    "a.grid-item__link".to_string()
}

fn default_card_heading_selector() -> String {
    ".grid-item__heading".to_string()
}

fn default_card_description_selector() -> String {
    ".grid-item__paragraph".to_string()
}

fn default_embedded_data_selector() -> String {
    "script[type='application/json'], script[type='application/ld+json']".to_string()
}

fn default_excluded_path_markers() -> Vec<String> {
    ["/category/", "/series/", "/family/"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_category_slugs() -> Vec<String> {
    [
        "drainage-solutions",
        "floor-drains-channels-trench",
        "roof-drains",
        "cleanouts",
        "interceptors",
        "parking-deck-drains",
        "fixture-carriers",
        "dead-level-trench-drains",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_page_size() -> Option<PageSizeControl> {
    Some(PageSizeControl {
        locator: Locator::css(".product-grid__dropdown"),
        value: "60".to_string(),
        wait_ms: default_page_size_wait_ms(),
        settle_ms: default_page_size_settle_ms(),
    })
}

fn default_page_size_wait_ms() -> u64 {
    2000
}

fn default_page_size_settle_ms() -> u64 {
    3000
}

fn default_max_subcategory_depth() -> usize {
    2
}

fn default_max_category_pages() -> usize {
    40
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            model_prefixes: default_prefixes(),
            taxonomy_root: default_taxonomy_root(),
            container_selector: default_container_selector(),
            model_attributes: default_model_attributes(),
            card_selector: default_card_selector(),
            card_link_selector: default_card_link_selector(),
            card_heading_selector: default_card_heading_selector(),
            card_description_selector: default_card_description_selector(),
            embedded_data_selector: default_embedded_data_selector(),
            excluded_path_markers: default_excluded_path_markers(),
            category_slugs: default_category_slugs(),
            page_size: default_page_size(),
            max_subcategory_depth: default_max_subcategory_depth(),
            max_category_pages: default_max_category_pages(),
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(ScrapeError::Config(
                "extraction.strategies must not be empty".to_string(),
            ));
        }
        if self.taxonomy_root.trim_matches('/').is_empty() {
            return Err(ScrapeError::Config(
                "extraction.taxonomy_root must not be empty".to_string(),
            ));
        }
        if self.max_category_pages == 0 {
            return Err(ScrapeError::Config(
                "extraction.max_category_pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Path fragment every product link contains, e.g. `/drainage-solutions/`.
    pub fn taxonomy_marker(&self) -> String {
        format!("/{}/", self.taxonomy_root.trim_matches('/'))
    }
}
