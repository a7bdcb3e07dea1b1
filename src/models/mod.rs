//! Data models for the crawl pipeline.

mod candidate;
mod category;
mod failure;
mod outcome;
mod resolution;
mod stats;

pub use candidate::{CandidateSet, ExtractionStrategy, ProductCandidate};
pub use category::{canonical_url, Category, CategoryEntry, CategoryTable, DEFAULT_BASE_URL};
pub use failure::{FailureRecord, FailureStage};
pub use outcome::{DownloadOutcome, DownloadStatus};
pub use resolution::SpecResolution;
pub use stats::{RunReport, RunStats};
