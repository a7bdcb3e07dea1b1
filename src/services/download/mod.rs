//! Spec-sheet download service.
//!
//! Downloads stream into a hidden `.part` file next to the target, are
//! validated as PDFs and only then renamed into place, so the final path
//! either holds a complete document or nothing.

mod layout;
mod validate;

pub use layout::OutputLayout;
pub use validate::{validate_pdf, validate_pdf_file};

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::models::{DownloadOutcome, FailureRecord, FailureStage};
use crate::scrapers::HttpClient;
use crate::utils::{content_type_matches, format_size};

/// Retry policy for transient download failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    /// Factor applied to the delay after each retry. 1.0 keeps it fixed.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_secs() -> f64 {
    2.0
}

fn default_multiplier() -> f64 {
    1.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.delay_secs * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ScrapeError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.delay_secs >= 0.0 && self.multiplier >= 1.0) {
            return Err(ScrapeError::Config(
                "retry.delay_secs must be >= 0 and retry.multiplier >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fetches verified spec-sheet URLs to disk.
pub struct Downloader {
    retry: RetryConfig,
    accepted: Vec<String>,
}

impl Downloader {
    /// `accepted` lists content-type fragments that count as a spec sheet.
    pub fn new(retry: RetryConfig, accepted: Vec<String>) -> Self {
        Self { retry, accepted }
    }

    /// Download `url` to `output_path` unless a file is already there.
    ///
    /// Transient failures are retried up to the configured attempt count;
    /// content-type and validation failures end the download at once.
    /// Never returns an error: failures come back as `Failed` outcomes.
    pub async fn download(&self, http: &HttpClient, url: &str, output_path: &Path) -> DownloadOutcome {
        if tokio::fs::try_exists(output_path).await.unwrap_or(false) {
            info!("File already exists: {}", output_path.display());
            return DownloadOutcome::already_exists(output_path.to_path_buf());
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch(http, url, output_path).await {
                Ok(bytes) => {
                    info!(
                        "Successfully downloaded {} to {} ({})",
                        url,
                        output_path.display(),
                        format_size(bytes)
                    );
                    return DownloadOutcome::success(output_path.to_path_buf(), bytes, attempt);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt, self.retry.max_attempts, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!("Failed to download {} after {} attempt(s): {}", url, attempt, e);
                    let failure = FailureRecord::from_error(FailureStage::Download, url, &e);
                    return DownloadOutcome::failed(output_path.to_path_buf(), attempt, failure);
                }
            }
        }
    }

    /// One attempt. Returns the number of bytes written.
    async fn fetch(&self, http: &HttpClient, url: &str, output_path: &Path) -> Result<u64> {
        let mut response = http.get(url).await?;
        if !response.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: response.status.as_u16(),
                url: url.to_string(),
            });
        }
        if !content_type_matches(response.content_type(), &self.accepted) {
            return Err(ScrapeError::ContentTypeMismatch {
                url: url.to_string(),
                actual: response.content_type().unwrap_or("none").to_string(),
                expected: self.accepted.clone(),
            });
        }

        let dir = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir).await?;

        // Dropping the temp path on any error below removes the partial file.
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(".specfetch-")
            .suffix(".part")
            .tempfile_in(dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        validate_pdf_file(&temp_path).await?;

        temp_path
            .persist(output_path)
            .map_err(|e| ScrapeError::Io(e.error))?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delays() {
        let fixed = RetryConfig::default();
        assert_eq!(fixed.delay_after(1), Duration::from_secs(2));
        assert_eq!(fixed.delay_after(2), Duration::from_secs(2));

        let growing = RetryConfig {
            multiplier: 2.0,
            ..Default::default()
        };
        assert_eq!(growing.delay_after(1), Duration::from_secs(2));
        assert_eq!(growing.delay_after(3), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_validation() {
        assert!(RetryConfig::default().validate().is_ok());
        let none = RetryConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(none.validate().is_err());
        let shrinking = RetryConfig {
            multiplier: 0.5,
            ..Default::default()
        };
        assert!(shrinking.validate().is_err());
    }

    #[tokio::test]
    async fn test_existing_file_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fd-100.pdf");
        tokio::fs::write(&path, b"existing").await.unwrap();

        let http = HttpClient::new(&Default::default(), None).unwrap();
        let downloader = Downloader::new(RetryConfig::default(), vec!["pdf".into()]);
        // Unroutable URL: a network call would fail, not short-circuit.
        let outcome = downloader
            .download(&http, "http://127.0.0.1:9/spec.pdf", &path)
            .await;

        assert_eq!(outcome.status, crate::models::DownloadStatus::AlreadyExists);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"existing");
    }
}
