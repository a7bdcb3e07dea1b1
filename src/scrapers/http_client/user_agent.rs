//! User-Agent selection.
//!
//! The HTTP session and the Chrome renderer present the same identity, so
//! cookies collected by one are accepted when replayed by the other.

/// Honest crawler identity, sent when no user agent is configured.
pub const CRAWLER_USER_AGENT: &str = concat!(
    "specfetch/",
    env!("CARGO_PKG_VERSION"),
    " (+spec sheet archiver)"
);

/// Desktop Chrome identity used for `"impersonate"` and by the renderer.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Map the configured value to a header value.
///
/// `None` and `"crawler"` select [`CRAWLER_USER_AGENT`], `"impersonate"`
/// selects [`BROWSER_USER_AGENT`]; anything else is sent as given.
pub fn resolve_user_agent(configured: Option<&str>) -> &str {
    match configured.map(str::trim) {
        None | Some("") | Some("crawler") => CRAWLER_USER_AGENT,
        Some("impersonate") => BROWSER_USER_AGENT,
        Some(custom) => custom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_crawler() {
        assert!(resolve_user_agent(None).starts_with("specfetch/"));
        assert_eq!(resolve_user_agent(Some("  ")), CRAWLER_USER_AGENT);
    }

    #[test]
    fn test_impersonate_matches_renderer() {
        let ua = resolve_user_agent(Some("impersonate"));
        assert_eq!(ua, BROWSER_USER_AGENT);
        assert!(ua.contains("Chrome/"));
    }

    #[test]
    fn test_custom_passthrough() {
        assert_eq!(resolve_user_agent(Some("AcmeBot/2.1")), "AcmeBot/2.1");
    }
}
