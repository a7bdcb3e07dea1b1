//! Product-link discovery on category pages.
//!
//! [`ProductLinkExtractor::extract`] runs every configured strategy against
//! one rendered snapshot and merges their results into a [`CandidateSet`].
//! A strategy that finds nothing never stops the ones after it.
//!
//! | Strategy        | Reads                                   | Product URL            |
//! |-----------------|-----------------------------------------|------------------------|
//! | `Containers`    | identity attributes, container text     | first `/products/` link |
//! | `ProductCards`  | `.grid-item` heading and paragraph      | card link              |
//! | `UrlPattern`    | anchor hrefs under the taxonomy root    | the href               |
//! | `EmbeddedData`  | JSON script payloads                    | synthesized            |
//! | `FullText`      | visible text                            | synthesized            |

mod config;
mod discovery;
mod model_code;

pub use config::{ExtractionConfig, PageSizeControl};
pub use discovery::Discovery;
pub use model_code::{ModelCodePattern, DEFAULT_PREFIXES};

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::models::{CandidateSet, Category, ExtractionStrategy, ProductCandidate};
use crate::utils::{last_path_segment, resolve_url};

/// Elements whose text is never shown to the user.
const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

struct Selectors {
    container: Selector,
    card: Selector,
    card_link: Selector,
    card_heading: Selector,
    card_description: Selector,
    embedded: Selector,
    anchor: Selector,
}

fn parse(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::Config(format!("invalid selector '{}': {}", css, e)))
}

impl Selectors {
    fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            container: parse(&config.container_selector)?,
            card: parse(&config.card_selector)?,
            card_link: parse(&config.card_link_selector)?,
            card_heading: parse(&config.card_heading_selector)?,
            card_description: parse(&config.card_description_selector)?,
            embedded: parse(&config.embedded_data_selector)?,
            anchor: parse("a[href]")?,
        })
    }
}

/// Turns rendered category pages into product candidates.
pub struct ProductLinkExtractor {
    config: ExtractionConfig,
    pattern: ModelCodePattern,
    selectors: Selectors,
}

impl ProductLinkExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let pattern = ModelCodePattern::new(&config.model_prefixes)?;
        let selectors = Selectors::new(&config)?;
        Ok(Self {
            config,
            pattern,
            selectors,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn pattern(&self) -> &ModelCodePattern {
        &self.pattern
    }

    /// Run the strategy cascade over one snapshot.
    ///
    /// `page_url` is the URL the snapshot was rendered from; relative links
    /// are resolved against it.
    pub fn extract(&self, html: &str, page_url: &str, category: &Category) -> CandidateSet {
        let document = Html::parse_document(html);
        let mut found = CandidateSet::new();

        for strategy in &self.config.strategies {
            let batch = match strategy {
                ExtractionStrategy::Containers => self.from_containers(&document, page_url),
                ExtractionStrategy::ProductCards => self.from_cards(&document, page_url),
                ExtractionStrategy::UrlPattern => self.from_urls(&document, page_url),
                ExtractionStrategy::EmbeddedData => self.from_embedded_data(&document, category),
                ExtractionStrategy::FullText => self.from_text(&document, category),
            };
            let seen = batch.len();
            let added = found.merge(batch);
            debug!(
                "{} strategy on {}: {} matches, {} new",
                strategy.as_str(),
                page_url,
                seen,
                added
            );
        }

        found
    }

    fn from_containers(&self, document: &Html, page_url: &str) -> CandidateSet {
        let mut set = CandidateSet::new();
        for container in document.select(&self.selectors.container) {
            let from_attr = self
                .config
                .model_attributes
                .iter()
                .filter_map(|name| container.value().attr(name))
                .find_map(|value| self.pattern.find(value));
            let Some(code) = from_attr.or_else(|| self.pattern.find(&element_text(&container)))
            else {
                continue;
            };

            let link = container
                .select(&self.selectors.anchor)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| href.contains("/products/"))
                .and_then(|href| resolve_url(page_url, href));

            match link {
                Some(url) => {
                    set.insert(ProductCandidate::new(url, code, ExtractionStrategy::Containers));
                }
                None => debug!("Container for {} has no product link", code),
            }
        }
        set
    }

    fn from_cards(&self, document: &Html, page_url: &str) -> CandidateSet {
        let mut set = CandidateSet::new();
        for card in document.select(&self.selectors.card) {
            let href = card
                .select(&self.selectors.card_link)
                .find_map(|a| a.value().attr("href"))
                .or_else(|| card.value().attr("href"));
            let Some(url) = href.and_then(|h| resolve_url(page_url, h)) else {
                continue;
            };

            let heading = card
                .select(&self.selectors.card_heading)
                .next()
                .map(|h| element_text(&h));
            let code = heading
                .as_deref()
                .and_then(|h| self.pattern.find(h))
                .or_else(|| self.pattern.find(&url));
            let Some(code) = code else {
                debug!("Card linking to {} has no model code", url);
                continue;
            };

            let description = card
                .select(&self.selectors.card_description)
                .next()
                .map(|p| element_text(&p));
            set.insert(
                ProductCandidate::new(url, code, ExtractionStrategy::ProductCards)
                    .with_description(description),
            );
        }
        set
    }

    fn from_urls(&self, document: &Html, page_url: &str) -> CandidateSet {
        let marker = self.config.taxonomy_marker();
        let mut set = CandidateSet::new();
        for anchor in document.select(&self.selectors.anchor) {
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_url(page_url, href))
            else {
                continue;
            };
            if !url.contains(&marker) || !self.is_product_url(&url) {
                continue;
            }
            let code = last_path_segment(&url).and_then(|segment| self.pattern.find(&segment));
            if let Some(code) = code {
                set.insert(ProductCandidate::new(url, code, ExtractionStrategy::UrlPattern));
            }
        }
        set
    }

    fn from_embedded_data(&self, document: &Html, category: &Category) -> CandidateSet {
        let mut set = CandidateSet::new();
        for script in document.select(&self.selectors.embedded) {
            let payload: String = script.text().collect();
            for code in self.pattern.find_all(&payload) {
                let url = self.synthesize_url(category, &code);
                set.insert(ProductCandidate::new(url, code, ExtractionStrategy::EmbeddedData));
            }
        }
        set
    }

    fn from_text(&self, document: &Html, category: &Category) -> CandidateSet {
        let mut set = CandidateSet::new();
        for code in self.pattern.find_all(&visible_text(document)) {
            let url = self.synthesize_url(category, &code);
            set.insert(ProductCandidate::new(url, code, ExtractionStrategy::FullText));
        }
        set
    }

    /// `{base}/products/{taxonomy_root}/{code}` for codes found without a link.
    pub fn synthesize_url(&self, category: &Category, model_code: &str) -> String {
        let canonical = category.canonical_url.as_str();
        let base = canonical
            .find("/products/")
            .map(|i| &canonical[..i])
            .unwrap_or(canonical);
        format!(
            "{}/products/{}/{}",
            base,
            self.config.taxonomy_root.trim_matches('/'),
            model_code.to_lowercase()
        )
    }

    /// Whether a link points at a product page rather than a listing.
    pub fn is_product_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        if self
            .config
            .excluded_path_markers
            .iter()
            .any(|marker| lower.contains(&marker.to_lowercase()))
        {
            return false;
        }
        let last = last_path_segment(&lower).unwrap_or_default();
        !self
            .config
            .category_slugs
            .iter()
            .any(|slug| last == slug.to_lowercase())
    }

    /// Subcategory listing links on a page, below `/products/{root}/`.
    ///
    /// Links to the page itself and links that look like product pages are
    /// left out. Order follows the document; duplicates are dropped.
    pub fn subcategory_links(&self, html: &str, page_url: &str, root: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let prefix = format!("/products/{}/", root.trim_matches('/'));
        let current = page_url.trim_end_matches('/');
        let mut seen = HashSet::new();

        document
            .select(&self.selectors.anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_url(page_url, href))
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| url.contains(&prefix) && url != current)
            .filter(|url| {
                let segment = last_path_segment(url).unwrap_or_default();
                !self.pattern.is_match(&segment)
            })
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text a reader would see: everything outside script-like elements.
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TEXT_TAGS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}
