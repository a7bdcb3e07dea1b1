//! Download outcomes.

use std::path::PathBuf;

use serde::Serialize;

use super::FailureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Success,
    AlreadyExists,
    Failed,
}

/// Result of one `Downloader::download` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    pub output_path: PathBuf,
    pub status: DownloadStatus,
    pub bytes_written: u64,
    /// Fetch attempts made; zero when the file already existed.
    pub attempts: u32,
    pub failure: Option<FailureRecord>,
}

impl DownloadOutcome {
    pub fn success(output_path: PathBuf, bytes_written: u64, attempts: u32) -> Self {
        Self {
            output_path,
            status: DownloadStatus::Success,
            bytes_written,
            attempts,
            failure: None,
        }
    }

    pub fn already_exists(output_path: PathBuf) -> Self {
        Self {
            output_path,
            status: DownloadStatus::AlreadyExists,
            bytes_written: 0,
            attempts: 0,
            failure: None,
        }
    }

    pub fn failed(output_path: PathBuf, attempts: u32, failure: FailureRecord) -> Self {
        Self {
            output_path,
            status: DownloadStatus::Failed,
            bytes_written: 0,
            attempts,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DownloadStatus::Success
    }
}
