//! URL helpers.

use url::Url;

/// Resolve a possibly-relative href against the page it was found on.
///
/// Returns `None` for empty hrefs and non-HTTP schemes (`javascript:`,
/// `mailto:`, ...). Fragments are dropped so the same page reached through
/// different anchors compares equal.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let base = Url::parse(base).ok()?;
    let mut joined = base.join(href).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    Some(joined.to_string())
}

/// Last non-empty path segment of a URL, if any.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}
