//! Error taxonomy for the crawl pipeline.
//!
//! Every stage returns these errors internally; the orchestrator converts
//! them into `FailureRecord`s at the stage boundary so none of them ends a run.

use std::time::Duration;

use thiserror::Error;

use crate::scrapers::browser::RenderError;

/// HTTP statuses worth retrying.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Errors raised by the crawl pipeline.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("category index {index} is out of range (0..{count})")]
    CategoryIndexOutOfRange { index: usize, count: usize },

    #[error("timed out after {timeout:?} waiting for {target}")]
    RenderTimeout { target: String, timeout: Duration },

    #[error("{url} served '{actual}', expected one of {expected:?}")]
    ContentTypeMismatch {
        url: String,
        actual: String,
        expected: Vec<String>,
    },

    #[error("document validation failed: {0}")]
    DocumentValidation(String),

    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("render failed: {0}")]
    Render(#[source] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransientNetwork(_) | Self::RenderTimeout { .. } => true,
            Self::HttpStatus { status, .. } => is_retryable_status(*status),
            Self::Render(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<RenderError> for ScrapeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout { target, timeout } => Self::RenderTimeout { target, timeout },
            other => Self::Render(other),
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::Config(err.to_string());
        }
        match err.status() {
            Some(status) => Self::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => Self::TransientNetwork(err.to_string()),
        }
    }
}

/// Check whether an HTTP status is worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
