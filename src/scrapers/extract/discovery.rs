//! Category crawl: render listing pages and collect candidates.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::ProductLinkExtractor;
use crate::error::ScrapeError;
use crate::models::{CandidateSet, Category, FailureRecord, FailureStage, ProductCandidate};
use crate::scrapers::browser::{RenderError, RenderedPage, WaitCondition, WaitOutcome};
use crate::services::RunContext;

/// Everything link discovery produced for one category.
#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<ProductCandidate>,
    pub failures: Vec<FailureRecord>,
    pub pages_rendered: usize,
}

impl ProductLinkExtractor {
    /// Render a category and, where needed, its subcategories, and extract
    /// every product candidate.
    ///
    /// Parent categories always have their subcategory pages followed. Other
    /// categories only fall back to subcategory pages when a page yields no
    /// candidates. Render failures are recorded and the crawl moves on.
    pub async fn discover(&self, ctx: &mut RunContext, category: &Category) -> Discovery {
        let mut found = CandidateSet::new();
        let mut failures = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([(category.canonical_url.clone(), 0usize)]);
        let mut root_html: Option<String> = None;
        let mut pages_rendered = 0;

        while let Some((url, depth)) = queue.pop_front() {
            if !visited.insert(url.trim_end_matches('/').to_string()) {
                continue;
            }
            if pages_rendered >= self.config.max_category_pages {
                warn!(
                    "Stopping {} after {} pages; {} links left unvisited",
                    category.name,
                    pages_rendered,
                    queue.len() + 1
                );
                break;
            }
            if pages_rendered > 0 {
                ctx.limiter.pause().await;
            }
            pages_rendered += 1;

            let page = match self.load(ctx, &url).await {
                Ok(page) => page,
                Err(e) => {
                    let err = ScrapeError::from(e);
                    warn!("Failed to render {}: {}", url, err);
                    failures.push(FailureRecord::from_error(FailureStage::LinkDiscovery, &url, &err));
                    continue;
                }
            };

            let batch = self.extract(&page.html, &page.final_url, category);
            let page_empty = batch.is_empty();
            let added = found.merge(batch);
            info!("{}: {} new candidates from {}", category.name, added, url);

            if depth < self.config.max_subcategory_depth {
                let root = match &category.subcategory_root {
                    Some(root) => Some(root.as_str()),
                    None if page_empty => Some(self.config.taxonomy_root.as_str()),
                    None => None,
                };
                if let Some(root) = root {
                    for link in self.subcategory_links(&page.html, &page.final_url, root) {
                        if !visited.contains(&link) {
                            debug!("Queueing subcategory {}", link);
                            queue.push_back((link, depth + 1));
                        }
                    }
                }
            }

            if root_html.is_none() {
                root_html = Some(page.html);
            }
        }

        if found.is_empty() {
            // A category page that failed to render is already on record.
            if let Some(html) = root_html {
                warn!("No product links found for category: {}", category.name);
                ctx.diagnostics
                    .persist("page_source", &category.canonical_url, &html)
                    .await;
                failures.push(FailureRecord::new(
                    FailureStage::LinkDiscovery,
                    &category.canonical_url,
                    "no candidates found",
                ));
            }
        }

        Discovery {
            candidates: found.into_vec(),
            failures,
            pages_rendered,
        }
    }

    /// Render a listing page, widening the grid first when it offers a
    /// page-size control.
    async fn load(&self, ctx: &mut RunContext, url: &str) -> Result<RenderedPage, RenderError> {
        let page = ctx.renderer.render(url).await?;
        let Some(control) = &self.config.page_size else {
            return Ok(page);
        };

        let wait = Duration::from_millis(control.wait_ms);
        let handle = match ctx
            .renderer
            .wait_for(&control.locator, WaitCondition::Present, wait)
            .await
        {
            Ok(WaitOutcome::Found(handle)) => handle,
            Ok(WaitOutcome::TimedOut) => return Ok(page),
            Err(e) => {
                debug!("Page-size control lookup failed on {}: {}", url, e);
                return Ok(page);
            }
        };

        if let Err(e) = ctx.renderer.select_option(&handle, &control.value).await {
            debug!("Could not set page size on {}: {}", url, e);
            return Ok(page);
        }
        tokio::time::sleep(Duration::from_millis(control.settle_ms)).await;

        match ctx.renderer.snapshot().await {
            Ok(expanded) => Ok(expanded),
            Err(e) => {
                debug!("Snapshot after page-size change failed on {}: {}", url, e);
                Ok(page)
            }
        }
    }
}
