//! Product page to spec-sheet URL.
//!
//! Resolution renders the product page, expands the "Specifications"
//! accordion, walks the link cascade and then probes the first link found.
//! Only a link whose probe answers with an accepted content type is
//! returned. Every strategy miss, timeout or script error moves on to the
//! next strategy; nothing here aborts the run.

mod config;

pub use config::ResolutionConfig;

use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};
use crate::models::{FailureRecord, FailureStage, SpecResolution};
use crate::scrapers::browser::{Locator, WaitCondition, WaitOutcome};
use crate::services::RunContext;
use crate::utils::{content_type_matches, resolve_url};

/// Resolves product pages to verified spec-sheet URLs.
pub struct SpecSheetResolver {
    config: ResolutionConfig,
}

impl SpecSheetResolver {
    pub fn new(config: ResolutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub async fn resolve(&self, ctx: &mut RunContext, product_url: &str) -> SpecResolution {
        info!("Getting spec sheet URL for {}", product_url);

        let page = match ctx.renderer.render(product_url).await {
            Ok(page) => page,
            Err(e) => {
                let err = ScrapeError::from(e);
                warn!("Failed to render {}: {}", product_url, err);
                return SpecResolution::not_found(
                    product_url,
                    FailureRecord::from_error(FailureStage::SpecResolution, product_url, &err),
                );
            }
        };

        self.dismiss_cookie_consent(ctx).await;

        match self.expand_specifications(ctx).await {
            Some(locator) => {
                debug!("Expanded specifications with {}", locator);
                tokio::time::sleep(self.config.settle()).await;
            }
            None => debug!("No specifications control on {}", product_url),
        }

        let failure = match self.find_spec_link(ctx, &page.final_url).await {
            Some(spec_url) => match self.verify(ctx, &spec_url).await {
                Ok(()) => {
                    info!("Found valid spec sheet URL: {}", spec_url);
                    return SpecResolution::verified(product_url, spec_url);
                }
                Err(e) => {
                    warn!("Discarding spec link {}: {}", spec_url, e);
                    FailureRecord::from_error(FailureStage::SpecResolution, product_url, &e)
                }
            },
            None => {
                warn!("Could not find spec sheet URL for {}", product_url);
                FailureRecord::new(
                    FailureStage::SpecResolution,
                    product_url,
                    "no specification link found",
                )
            }
        };

        let html = match ctx.renderer.snapshot().await {
            Ok(current) => current.html,
            Err(_) => page.html,
        };
        ctx.diagnostics.persist("product_page", product_url, &html).await;

        SpecResolution::not_found(product_url, failure)
    }

    /// Click the consent banner once per run, if one shows up.
    async fn dismiss_cookie_consent(&self, ctx: &mut RunContext) {
        if ctx.consent_checked {
            return;
        }
        ctx.consent_checked = true;
        let Some(locator) = &self.config.cookie_consent else {
            return;
        };

        if let Ok(WaitOutcome::Found(handle)) = ctx
            .renderer
            .wait_for(locator, WaitCondition::Clickable, self.config.consent_wait())
            .await
        {
            match ctx.renderer.click(&handle).await {
                Ok(()) => info!("Accepted cookie consent"),
                Err(e) => debug!("Cookie consent click failed: {}", e),
            }
        }
    }

    /// Try each expand control until one is clicked.
    async fn expand_specifications(&self, ctx: &mut RunContext) -> Option<&Locator> {
        for locator in &self.config.expand_cascade {
            debug!("Trying expand selector: {}", locator);
            let handle = match ctx
                .renderer
                .wait_for(locator, WaitCondition::Clickable, self.config.wait_timeout())
                .await
            {
                Ok(WaitOutcome::Found(handle)) => handle,
                Ok(WaitOutcome::TimedOut) => continue,
                Err(e) => {
                    debug!("Expand selector {} failed: {}", locator, e);
                    continue;
                }
            };

            match ctx.renderer.click(&handle).await {
                Ok(()) => return Some(locator),
                Err(e) => debug!("Click on {} failed: {}", handle, e),
            }
        }
        None
    }

    /// First spec link found by the cascade, as an absolute URL.
    async fn find_spec_link(&self, ctx: &mut RunContext, page_url: &str) -> Option<String> {
        for locator in &self.config.link_cascade {
            debug!("Trying spec link selector: {}", locator);
            let handle = match ctx
                .renderer
                .wait_for(locator, WaitCondition::Present, self.config.link_wait())
                .await
            {
                Ok(WaitOutcome::Found(handle)) => handle,
                Ok(WaitOutcome::TimedOut) => continue,
                Err(e) => {
                    debug!("Spec link selector {} failed: {}", locator, e);
                    continue;
                }
            };

            let href = match ctx.renderer.attribute(&handle, "href").await {
                Ok(Some(href)) => href,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Reading href of {} failed: {}", handle, e);
                    continue;
                }
            };

            if let Some(url) = resolve_url(page_url, &href) {
                info!("Found spec link with selector: {}", locator);
                return Some(url);
            }
        }
        None
    }

    /// Header-only probe: the link must answer 2xx with an accepted type.
    async fn verify(&self, ctx: &RunContext, url: &str) -> Result<()> {
        let response = ctx.http.head(url).await?;
        if !response.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: response.status.as_u16(),
                url: url.to_string(),
            });
        }
        let accepted = &self.config.accepted_content_types;
        if !content_type_matches(response.content_type(), accepted) {
            return Err(ScrapeError::ContentTypeMismatch {
                url: url.to_string(),
                actual: response.content_type().unwrap_or("none").to_string(),
                expected: accepted.clone(),
            });
        }
        Ok(())
    }
}
