//! Progress events emitted during a run.

use crate::models::RunStats;

/// How one product ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductResult {
    Downloaded { bytes: u64 },
    AlreadyExists,
    DownloadFailed { reason: String },
    Unresolved { reason: String },
}

/// Events for progress tracking.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A category is about to be crawled.
    CategoryStarted {
        index: usize,
        total: usize,
        name: String,
    },
    /// Link discovery finished for a category.
    CandidatesFound { category: String, count: usize },
    /// A product was resolved and (maybe) downloaded.
    ProductFinished {
        category: String,
        model_code: String,
        result: ProductResult,
    },
    /// A category is done; `stats` are the run totals so far.
    CategoryFinished { name: String, stats: RunStats },
}
