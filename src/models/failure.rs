//! Failure bookkeeping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ScrapeError;

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    LinkDiscovery,
    SpecResolution,
    Download,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkDiscovery => "link_discovery",
            Self::SpecResolution => "spec_resolution",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage-local failure. Appended to the run log, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub stage: FailureStage,
    pub url: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    /// Whether the failure looks like the site pushing back (timeouts,
    /// 429/5xx, dropped connections) rather than missing content.
    pub transient: bool,
}

impl FailureRecord {
    pub fn new(stage: FailureStage, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage,
            url: url.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
            transient: false,
        }
    }

    /// Build a record from a pipeline error, keeping its transient flag.
    pub fn from_error(stage: FailureStage, url: impl Into<String>, err: &ScrapeError) -> Self {
        Self::new(stage, url, err.to_string()).transient(err.is_transient())
    }

    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.stage,
            self.url,
            self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_keeps_transient_flag() {
        let err = ScrapeError::HttpStatus {
            status: 503,
            url: "https://example.com/a.pdf".into(),
        };
        let record = FailureRecord::from_error(FailureStage::Download, "https://example.com/a.pdf", &err);
        assert!(record.transient);
        assert_eq!(record.stage, FailureStage::Download);
        assert!(record.reason.contains("503"));
    }

    #[test]
    fn test_display() {
        let record = FailureRecord::new(
            FailureStage::LinkDiscovery,
            "https://example.com/products/x",
            "no candidates found",
        );
        let line = record.to_string();
        assert!(line.contains("link_discovery"));
        assert!(line.ends_with("https://example.com/products/x: no candidates found"));
    }
}
