//! Spec-sheet resolution configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::scrapers::browser::Locator;

/// Settings for [`SpecSheetResolver`](super::SpecSheetResolver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Controls that expand the "Specifications" panel, tried in order.
    #[serde(default = "default_expand_cascade")]
    pub expand_cascade: Vec<Locator>,

    /// Spec-sheet anchors, most specific first. First match wins.
    #[serde(default = "default_link_cascade")]
    pub link_cascade: Vec<Locator>,

    /// Wait for each expand control to become clickable, in milliseconds.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Wait for each spec-link locator, in milliseconds.
    #[serde(default = "default_link_wait_ms")]
    pub link_wait_ms: u64,

    /// Pause after expanding the panel, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Cookie banner button dismissed once per run.
    #[serde(default = "default_cookie_consent")]
    pub cookie_consent: Option<Locator>,

    #[serde(default = "default_consent_wait_ms")]
    pub consent_wait_ms: u64,

    /// Content-type fragments that identify a spec sheet.
    #[serde(default = "default_accepted_content_types")]
    pub accepted_content_types: Vec<String>,
}

const SPECIFICATIONS: &str = "Specifications";

/// Anchor whose href ends in the document extension.
const PDF_ANCHOR: &str = "a[href$='.pdf']";

fn default_expand_cascade() -> Vec<Locator> {
    vec![
        Locator::css("button[class*='js-accordion__trigger']").with_text(SPECIFICATIONS),
        Locator::css("button[class*='accordion__trigger']").with_text(SPECIFICATIONS),
        Locator::css("button").near("h2", SPECIFICATIONS),
        Locator::css("button").within("div[class*='specifications']"),
        Locator::css("button[class*='expand']").with_text(SPECIFICATIONS),
        Locator::css("button[class*='toggle']").with_text(SPECIFICATIONS),
        Locator::css("button").within("div[class*='specs']"),
        Locator::css("button").within("div[class*='technical']"),
    ]
}

fn default_link_cascade() -> Vec<Locator> {
    vec![
        Locator::css("a[class*='product-download__link']").with_text("Specification Sheet"),
        Locator::css("a[class*='product-download__link'][href*='.pdf']"),
        Locator::css(PDF_ANCHOR).within("div[class*='product-downloads']"),
        Locator::css(PDF_ANCHOR).within("ul[class*='product-downloads']"),
        Locator::css(PDF_ANCHOR)
            .with_text("spec")
            .within("#downloads, #resources"),
        Locator::css(PDF_ANCHOR).with_text("Spec"),
        Locator::css(PDF_ANCHOR).with_text("Sheet"),
        Locator::css("a[href$='.pdf'][class*='download']"),
        Locator::css("a[href$='.pdf'][class*='spec']"),
        Locator::css(PDF_ANCHOR).within("#downloads, #resources"),
        Locator::css(PDF_ANCHOR),
    ]
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

fn default_link_wait_ms() -> u64 {
    3_000
}

fn default_settle_ms() -> u64 {
    2_000
}

fn default_cookie_consent() -> Option<Locator> {
    Some(Locator::css("#onetrust-accept-btn-handler"))
}

fn default_consent_wait_ms() -> u64 {
    3_000
}

fn default_accepted_content_types() -> Vec<String> {
    vec!["pdf".to_string(), "octet-stream".to_string()]
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            expand_cascade: default_expand_cascade(),
            link_cascade: default_link_cascade(),
            wait_timeout_ms: default_wait_timeout_ms(),
            link_wait_ms: default_link_wait_ms(),
            settle_ms: default_settle_ms(),
            cookie_consent: default_cookie_consent(),
            consent_wait_ms: default_consent_wait_ms(),
            accepted_content_types: default_accepted_content_types(),
        }
    }
}

impl ResolutionConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn link_wait(&self) -> Duration {
        Duration::from_millis(self.link_wait_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn consent_wait(&self) -> Duration {
        Duration::from_millis(self.consent_wait_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.link_cascade.is_empty() {
            return Err(ScrapeError::Config(
                "resolution.link_cascade must not be empty".to_string(),
            ));
        }
        if self.accepted_content_types.is_empty() {
            return Err(ScrapeError::Config(
                "resolution.accepted_content_types must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cascades_go_from_specific_to_generic() {
        let config = ResolutionConfig::default();
        assert_eq!(config.expand_cascade.len(), 8);
        let last = config.link_cascade.last().unwrap();
        assert_eq!(last, &Locator::css("a[href$='.pdf']"));
        assert_eq!(
            config.link_cascade[0].text.as_deref(),
            Some("Specification Sheet")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generic_fallback_needs_pdf_suffix() {
        use crate::scrapers::browser::locator::select;
        use scraper::Html;

        let html = Html::parse_document(
            r#"<a href="/viewer/fd-100.pdf.html">View</a> <a href="/docs/fd-100.pdf">PDF</a>"#,
        );
        let last = ResolutionConfig::default().link_cascade.pop().unwrap();
        let hrefs: Vec<_> = select(&html, &last)
            .unwrap()
            .iter()
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs, vec!["/docs/fd-100.pdf"]);
    }

    #[test]
    fn test_cascade_from_toml() {
        let config: ResolutionConfig = toml::from_str(
            r#"
            settle_ms = 0
            link_cascade = [
                { css = "a.spec", text = "Spec" },
                { css = "a", within = { css = "h2", text = "Docs", parent = true } },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.settle(), Duration::ZERO);
        assert_eq!(config.link_cascade[0], Locator::css("a.spec").with_text("Spec"));
        assert_eq!(config.link_cascade[1], Locator::css("a").near("h2", "Docs"));
        assert_eq!(config.expand_cascade.len(), 8);
    }
}
