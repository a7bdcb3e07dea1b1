//! Service layer: downloads, diagnostics and run orchestration.
//!
//! Services hold the pipeline's business logic, separate from the CLI.

pub mod diagnostics;
pub mod download;
pub mod orchestrator;

pub use diagnostics::DiagnosticSink;
pub use download::{Downloader, OutputLayout, RetryConfig};
pub use orchestrator::{CategorySelection, ProductResult, RunContext, RunEvent, RunOrchestrator};
