//! Aggregate run statistics.

use std::time::Duration;

use serde::Serialize;

use super::{DownloadOutcome, DownloadStatus, FailureRecord};

/// Monotonic counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub categories_processed: u64,
    pub products_found: u64,
    pub specs_resolved: u64,
    pub downloads_succeeded: u64,
    pub downloads_failed: u64,
    /// Spec sheets already on disk.
    pub downloads_skipped: u64,
}

impl RunStats {
    pub fn record_download(&mut self, outcome: &DownloadOutcome) {
        match outcome.status {
            DownloadStatus::Success => self.downloads_succeeded += 1,
            DownloadStatus::AlreadyExists => self.downloads_skipped += 1,
            DownloadStatus::Failed => self.downloads_failed += 1,
        }
    }
}

/// Everything a finished run reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub stats: RunStats,
    /// Failures in the order they happened.
    pub failures: Vec<FailureRecord>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
