//! Crawl stages and the sessions they run on.
//!
//! - [`browser`]: page rendering behind the [`PageRenderer`] trait.
//! - [`http_client`]: the shared HTTP session.
//! - [`rate_limiter`]: adaptive pacing.
//! - [`extract`]: category page to product candidates.
//! - [`resolve`]: product page to verified spec-sheet URL.

pub mod browser;
pub mod extract;
pub mod http_client;
pub mod rate_limiter;
pub mod resolve;

pub use browser::{create_renderer, BrowserConfig, HttpRenderer, PageRenderer};
#[cfg(feature = "browser")]
pub use browser::BrowserRenderer;
pub use extract::{ExtractionConfig, ModelCodePattern, ProductLinkExtractor};
pub use http_client::{HttpClient, HttpConfig};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use resolve::{ResolutionConfig, SpecSheetResolver};
