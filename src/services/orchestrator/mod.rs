//! Run orchestration: categories, then products, then downloads.
//!
//! One actor walks the selected categories in table order. For each it
//! discovers candidates, then resolves and downloads each candidate in
//! discovery order, pacing with the run's [`RateLimiter`]. Stage failures
//! become [`FailureRecord`]s on the report; none of them stops the run.
//!
//! [`RateLimiter`]: crate::scrapers::rate_limiter::RateLimiter

mod context;
mod events;

pub use context::RunContext;
pub use events::{ProductResult, RunEvent};

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{Result, ScrapeError};
use crate::models::{
    Category, CategoryTable, DownloadOutcome, DownloadStatus, FailureRecord, FailureStage,
    ProductCandidate, RunReport,
};
use crate::scrapers::extract::ProductLinkExtractor;
use crate::scrapers::resolve::SpecSheetResolver;
use crate::services::download::{Downloader, OutputLayout};

/// Which categories a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    All,
    /// Zero-based index into the category table.
    Index(usize),
    /// Categories by name. Unknown names are skipped.
    Names(Vec<String>),
}

/// Drives the crawl pipeline over a set of categories.
pub struct RunOrchestrator {
    settings: Settings,
    table: CategoryTable,
    extractor: ProductLinkExtractor,
    resolver: SpecSheetResolver,
    downloader: Downloader,
    layout: OutputLayout,
    events: Option<mpsc::Sender<RunEvent>>,
}

impl RunOrchestrator {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let extractor = ProductLinkExtractor::new(settings.extraction.clone())?;
        let resolver = SpecSheetResolver::new(settings.resolution.clone())?;
        let downloader = Downloader::new(
            settings.retry.clone(),
            settings.resolution.accepted_content_types.clone(),
        );
        let layout = OutputLayout::new(settings.output_dir.clone(), extractor.pattern().clone());

        Ok(Self {
            table: settings.category_table(),
            settings,
            extractor,
            resolver,
            downloader,
            layout,
            events: None,
        })
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn extractor(&self) -> &ProductLinkExtractor {
        &self.extractor
    }

    pub fn resolver(&self) -> &SpecSheetResolver {
        &self.resolver
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Turn a selection into categories.
    ///
    /// An out-of-range index is an error. Unknown names are skipped with a
    /// warning, unless none of the names is known.
    pub fn select(&self, selection: &CategorySelection) -> Result<Vec<Category>> {
        match selection {
            CategorySelection::All => Ok(self.table.all()),
            CategorySelection::Index(index) => Ok(vec![self.table.get(*index)?]),
            CategorySelection::Names(names) => {
                let mut categories = Vec::new();
                let mut last_error = None;
                for name in names {
                    match self.table.resolve(name) {
                        Ok(category) => categories.push(category),
                        Err(e) => {
                            warn!("Skipping category: {}", e);
                            last_error = Some(e);
                        }
                    }
                }
                match (categories.is_empty(), last_error) {
                    (true, Some(e)) => Err(e),
                    (true, None) => Err(ScrapeError::Config("no categories selected".to_string())),
                    _ => Ok(categories),
                }
            }
        }
    }

    /// Select, open a run context, run, and close the context.
    ///
    /// Only an invalid selection or a failure to open the session is an
    /// error; everything after that lands in the report.
    pub async fn execute(&self, selection: &CategorySelection) -> Result<RunReport> {
        let categories = self.select(selection)?;
        let mut ctx = RunContext::open(&self.settings).await?;
        let report = self.run(&mut ctx, &categories).await;
        ctx.close().await;
        Ok(report)
    }

    /// Process categories in order and return the aggregate report.
    pub async fn run(&self, ctx: &mut RunContext, categories: &[Category]) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::default();

        for (index, category) in categories.iter().enumerate() {
            if index > 0 {
                ctx.limiter.pause_between_categories().await;
            }
            info!("Starting to scrape category: {}", category.name);
            self.emit(RunEvent::CategoryStarted {
                index,
                total: categories.len(),
                name: category.name.clone(),
            })
            .await;

            self.process_category(ctx, category, &mut report).await;
            report.stats.categories_processed += 1;

            self.emit(RunEvent::CategoryFinished {
                name: category.name.clone(),
                stats: report.stats,
            })
            .await;
        }

        report.elapsed = started.elapsed();
        info!(
            "Run finished: {} categories, {} products, {} specs, {} downloaded, {} failed",
            report.stats.categories_processed,
            report.stats.products_found,
            report.stats.specs_resolved,
            report.stats.downloads_succeeded,
            report.stats.downloads_failed
        );
        report
    }

    async fn process_category(&self, ctx: &mut RunContext, category: &Category, report: &mut RunReport) {
        let discovery = self.extractor.discover(ctx, category).await;
        for failure in discovery.failures {
            if failure.transient {
                ctx.limiter.record_failure();
            }
            report.failures.push(failure);
        }

        let candidates = discovery.candidates;
        report.stats.products_found += candidates.len() as u64;
        info!("Found {} products in {}", candidates.len(), category.name);
        self.emit(RunEvent::CandidatesFound {
            category: category.name.clone(),
            count: candidates.len(),
        })
        .await;
        ctx.limiter.pause().await;

        let total = candidates.len();
        for (i, candidate) in candidates.iter().enumerate() {
            info!("Processing product {}/{}: {}", i + 1, total, candidate.model_code);
            let pushed_back = self.process_product(ctx, category, candidate, report).await;
            if pushed_back {
                ctx.limiter.record_failure();
            } else {
                ctx.limiter.record_success();
            }
            ctx.limiter.pause().await;
        }
    }

    /// Resolve and download one product. Returns true when a failure
    /// looked like the site pushing back.
    async fn process_product(
        &self,
        ctx: &mut RunContext,
        category: &Category,
        candidate: &ProductCandidate,
        report: &mut RunReport,
    ) -> bool {
        let output_path = self.layout.path_for(&category.name, candidate);
        if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            info!("Already have {}: {}", candidate.model_code, output_path.display());
            report
                .stats
                .record_download(&DownloadOutcome::already_exists(output_path));
            self.emit(RunEvent::ProductFinished {
                category: category.name.clone(),
                model_code: candidate.model_code.clone(),
                result: ProductResult::AlreadyExists,
            })
            .await;
            return false;
        }

        let resolution = self.resolver.resolve(ctx, &candidate.product_url).await;

        let accepted = resolution.accepted_url().map(str::to_string);
        let Some(spec_url) = accepted else {
            let failure = resolution.failure.unwrap_or_else(|| {
                FailureRecord::new(
                    FailureStage::SpecResolution,
                    &candidate.product_url,
                    "no specification link found",
                )
            });
            self.emit(RunEvent::ProductFinished {
                category: category.name.clone(),
                model_code: candidate.model_code.clone(),
                result: ProductResult::Unresolved {
                    reason: failure.reason.clone(),
                },
            })
            .await;
            let transient = failure.transient;
            report.failures.push(failure);
            return transient;
        };
        report.stats.specs_resolved += 1;

        let outcome = self.downloader.download(&ctx.http, &spec_url, &output_path).await;
        report.stats.record_download(&outcome);

        let result = match (&outcome.status, &outcome.failure) {
            (DownloadStatus::Success, _) => ProductResult::Downloaded {
                bytes: outcome.bytes_written,
            },
            (DownloadStatus::AlreadyExists, _) => ProductResult::AlreadyExists,
            (DownloadStatus::Failed, failure) => ProductResult::DownloadFailed {
                reason: failure
                    .as_ref()
                    .map(|f| f.reason.clone())
                    .unwrap_or_default(),
            },
        };
        self.emit(RunEvent::ProductFinished {
            category: category.name.clone(),
            model_code: candidate.model_code.clone(),
            result,
        })
        .await;

        match outcome.failure {
            Some(failure) => {
                let transient = failure.transient;
                report.failures.push(failure);
                transient
            }
            None => false,
        }
    }

    async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
