//! Page rendering.
//!
//! The crawl pipeline talks to rendered pages only through
//! [`PageRenderer`]: render a URL, wait for an element, click it, read an
//! attribute, take a snapshot. Two backends implement it:
//!
//! - `BrowserRenderer` drives Chrome over CDP (chromiumoxide) and executes
//!   the site's scripts. Requires the `browser` feature.
//! - `HttpRenderer` fetches markup over plain HTTP and evaluates locators
//!   statically; clicks are no-ops.

mod config;
pub mod locator;
mod static_page;

#[cfg(feature = "browser")]
mod chromium;

pub use config::BrowserConfig;
pub use locator::{Locator, Scope};
pub use static_page::HttpRenderer;

#[cfg(feature = "browser")]
pub use chromium::BrowserRenderer;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::http_client::HttpClient;

/// Errors at the renderer boundary.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("timed out after {timeout:?} waiting for {target}")]
    Timeout { target: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        url: String,
        reason: String,
        transient: bool,
    },

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("element {0} is no longer on the page")]
    StaleElement(String),

    #[error("no page has been rendered yet")]
    NoPage,

    #[error("browser unavailable: {0}")]
    Unavailable(String),
}

impl RenderError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Navigation { transient, .. } => *transient,
            _ => false,
        }
    }
}

/// A rendered DOM snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL that was requested.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    /// Serialized DOM after scripts ran.
    pub html: String,
}

/// What `wait_for` waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// The element exists in the DOM.
    Present,
    /// The element exists, is visible and enabled.
    Clickable,
}

/// Reference to the `index`-th element matched by `locator`.
///
/// Handles are re-resolved on every use, so a handle whose element was
/// removed fails with [`RenderError::StaleElement`] instead of acting on
/// a different node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub locator: Locator,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(locator: Locator, index: usize) -> Self {
        Self { locator, index }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.locator, self.index)
    }
}

/// Result of waiting for an element. A timeout is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Found(ElementHandle),
    TimedOut,
}

/// Interactive access to a rendered page.
///
/// Implementations hold at most one current page; every method other than
/// `render` and `close` acts on it.
#[async_trait]
pub trait PageRenderer: Send {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Load a URL, run its scripts, scroll to the bottom and return the DOM.
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError>;

    /// Wait until an element matches the locator and condition.
    async fn wait_for(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<WaitOutcome, RenderError>;

    /// Click an element through script injection.
    async fn click(&mut self, handle: &ElementHandle) -> Result<(), RenderError>;

    /// Select an option of a `<select>` element by value.
    async fn select_option(&mut self, handle: &ElementHandle, value: &str)
        -> Result<(), RenderError>;

    /// Read an attribute of an element.
    async fn attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError>;

    /// Current DOM of the page, after any interaction.
    async fn snapshot(&mut self) -> Result<RenderedPage, RenderError>;

    /// Release the page and any browser process.
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Build the renderer the configuration asks for.
///
/// Falls back to [`HttpRenderer`] when the browser is disabled or the crate
/// was built without the `browser` feature.
pub fn create_renderer(config: &BrowserConfig, http: HttpClient) -> Box<dyn PageRenderer> {
    #[cfg(feature = "browser")]
    if config.enabled {
        return Box::new(BrowserRenderer::new(config.clone()));
    }

    #[cfg(not(feature = "browser"))]
    if config.enabled {
        tracing::warn!(
            "Browser support not compiled (rebuild with --features browser); using plain HTTP rendering"
        );
    }

    Box::new(HttpRenderer::new(http))
}
