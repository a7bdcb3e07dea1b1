//! Content-type checks for the expected document type.

/// Check a Content-Type header value against accepted type fragments.
///
/// Matching is a case-insensitive substring test on the media type, so
/// `"pdf"` accepts `application/pdf; charset=binary` and `application/x-pdf`.
pub fn content_type_matches(content_type: Option<&str>, accepted: &[String]) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if media_type.is_empty() {
        return false;
    }
    accepted
        .iter()
        .any(|fragment| media_type.contains(&fragment.to_lowercase()))
}

/// Check file content magic bytes for a PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    infer::get(data)
        .map(|kind| kind.mime_type() == "application/pdf")
        .unwrap_or(false)
}
