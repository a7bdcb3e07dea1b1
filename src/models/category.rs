//! Product categories and the static category table.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

/// Catalog site the built-in table points at.
pub const DEFAULT_BASE_URL: &str = "https://www.watts.com";

/// Built-in table: (name, path segment, subcategory root).
const BUILTIN_CATEGORIES: &[(&str, &str, Option<&str>)] = &[
    (
        "Floor & Area Drains",
        "drainage-solutions/floor-drains-channels-trench/floor-area-drains",
        None,
    ),
    ("Roof Drains", "drainage-solutions/roof-drains", None),
    (
        "Dead Level Trench Drains",
        "drainage-solutions/floor-drains-channels-trench/dead-level-trench-drains",
        None,
    ),
    (
        "Cleanouts",
        "drainage-solutions/floor-drains-channels-trench/cleanouts",
        None,
    ),
    (
        "Interceptors",
        "drainage-solutions/interceptors",
        Some("drainage-solutions/floor-drains-channels-trench/interceptors"),
    ),
    (
        "Green Roof Drains",
        "drainage-solutions/roof-drains/green-roof-drains",
        None,
    ),
    (
        "Parking Deck Drains",
        "drainage-solutions/roof-drains/parking-deck-drains",
        None,
    ),
];

/// Category table entry as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Human-readable category name.
    pub name: String,
    /// URL path segment below `/products/`.
    pub segment: String,
    /// Path segment shared by subcategory pages of a parent category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_root: Option<String>,
}

/// A resolved product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub canonical_url: String,
    pub subcategory_root: Option<String>,
}

impl Category {
    /// Whether this category's listing links to subcategory pages.
    pub fn is_parent(&self) -> bool {
        self.subcategory_root.is_some()
    }
}

/// Build the product-listing URL for a path segment.
pub fn canonical_url(base_url: &str, segment: &str) -> String {
    format!(
        "{}/products/{}",
        base_url.trim_end_matches('/'),
        segment.trim_matches('/')
    )
}

/// Ordered, immutable mapping of category names to path segments.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    base_url: String,
    entries: Vec<CategoryEntry>,
}

impl CategoryTable {
    pub fn new(base_url: impl Into<String>, entries: Vec<CategoryEntry>) -> Self {
        Self {
            base_url: base_url.into(),
            entries,
        }
    }

    /// The built-in drainage category table.
    pub fn builtin(base_url: impl Into<String>) -> Self {
        Self::new(base_url, Self::default_entries())
    }

    pub fn default_entries() -> Vec<CategoryEntry> {
        BUILTIN_CATEGORIES
            .iter()
            .map(|(name, segment, root)| CategoryEntry {
                name: name.to_string(),
                segment: segment.to_string(),
                subcategory_root: root.map(|r| r.to_string()),
            })
            .collect()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a category by exact name.
    pub fn resolve(&self, name: &str) -> Result<Category> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| self.to_category(e))
            .ok_or_else(|| ScrapeError::UnknownCategory(name.to_string()))
    }

    /// Resolve a category name to its canonical listing URL.
    pub fn resolve_url(&self, name: &str) -> Result<String> {
        self.resolve(name).map(|c| c.canonical_url)
    }

    /// Look up a category by its position in the table.
    pub fn get(&self, index: usize) -> Result<Category> {
        self.entries
            .get(index)
            .map(|e| self.to_category(e))
            .ok_or(ScrapeError::CategoryIndexOutOfRange {
                index,
                count: self.entries.len(),
            })
    }

    /// All categories in table order.
    pub fn all(&self) -> Vec<Category> {
        self.entries.iter().map(|e| self.to_category(e)).collect()
    }

    fn to_category(&self, entry: &CategoryEntry) -> Category {
        Category {
            name: entry.name.clone(),
            slug: entry.segment.trim_matches('/').to_string(),
            canonical_url: canonical_url(&self.base_url, &entry.segment),
            subcategory_root: entry.subcategory_root.clone(),
        }
    }
}
