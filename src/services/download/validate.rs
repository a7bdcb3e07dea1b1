//! Checks that a downloaded file really is a PDF document.

use std::path::Path;

use lopdf::Document;

use crate::error::{Result, ScrapeError};
use crate::utils::is_pdf_bytes;

/// How far from the end `%%EOF` may sit.
const TRAILER_WINDOW: usize = 1024;

/// Check a downloaded file is a complete PDF.
pub async fn validate_pdf_file(path: &Path) -> Result<()> {
    let data = tokio::fs::read(path).await?;
    validate_pdf(&data)
}

/// Check that bytes parse as a PDF document with a catalog.
///
/// The magic bytes and end marker are checked first so a login page or a
/// truncated body gets a precise reason; the rest is left to the parser.
pub fn validate_pdf(data: &[u8]) -> Result<()> {
    if !is_pdf_bytes(data) {
        return Err(invalid("missing %PDF- header"));
    }

    let tail = &data[data.len().saturating_sub(TRAILER_WINDOW)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(invalid("missing %%EOF marker (truncated download?)"));
    }

    let document = Document::load_mem(data)
        .map_err(|e| ScrapeError::DocumentValidation(format!("unparseable PDF: {}", e)))?;
    if document.trailer.get(b"Root").is_err() {
        return Err(invalid("trailer has no document catalog"));
    }

    Ok(())
}

fn invalid(reason: &str) -> ScrapeError {
    ScrapeError::DocumentValidation(reason.to_string())
}
