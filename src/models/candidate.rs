//! Product candidates discovered on category pages.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Extraction strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Containers carrying product-identity data attributes.
    Containers,
    /// Product grid cards (`.grid-item`).
    ProductCards,
    /// Anchors whose href carries a model code.
    UrlPattern,
    /// Inline structured-data script payloads.
    EmbeddedData,
    /// Visible page text.
    FullText,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Containers => "containers",
            Self::ProductCards => "product_cards",
            Self::UrlPattern => "url_pattern",
            Self::EmbeddedData => "embedded_data",
            Self::FullText => "full_text",
        }
    }

    /// Whether this strategy invents the product URL instead of reading it.
    pub fn synthesizes_url(&self) -> bool {
        matches!(self, Self::EmbeddedData | Self::FullText)
    }
}

/// A product page found during link discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCandidate {
    pub product_url: String,
    /// Upper-cased model code, e.g. `FD-100`.
    pub model_code: String,
    pub description: Option<String>,
    pub strategy: ExtractionStrategy,
}

impl ProductCandidate {
    pub fn new(
        product_url: impl Into<String>,
        model_code: impl Into<String>,
        strategy: ExtractionStrategy,
    ) -> Self {
        Self {
            product_url: product_url.into(),
            model_code: model_code.into(),
            description: None,
            strategy,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    /// Identity key within one category's extraction pass.
    pub fn key(&self) -> (&str, &str) {
        (&self.product_url, &self.model_code)
    }
}

/// Insertion-ordered set of candidates keyed by `(product_url, model_code)`.
///
/// The first candidate inserted for a key wins; later duplicates are
/// dropped whole, auxiliary fields included.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    items: Vec<ProductCandidate>,
    keys: HashSet<(String, String)>,
    codes: HashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate. Returns false if its key was already present.
    pub fn insert(&mut self, candidate: ProductCandidate) -> bool {
        let key = (
            candidate.product_url.clone(),
            candidate.model_code.clone(),
        );
        if !self.keys.insert(key) {
            return false;
        }
        self.codes.insert(candidate.model_code.clone());
        self.items.push(candidate);
        true
    }

    /// Whether any candidate carries this model code.
    pub fn contains_code(&self, model_code: &str) -> bool {
        self.codes.contains(model_code)
    }

    /// Merge another set in, keeping this set's entries on conflict.
    /// Returns the number of new candidates.
    pub fn merge(&mut self, other: CandidateSet) -> usize {
        let mut added = 0;
        for c in other.items {
            // A synthesized URL for a code already found with a real link adds nothing.
            if self.contains_code(&c.model_code) && c.strategy.synthesizes_url() {
                continue;
            }
            if self.insert(c) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductCandidate> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<ProductCandidate> {
        self.items
    }
}
