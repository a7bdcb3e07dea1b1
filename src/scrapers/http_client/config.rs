//! HTTP client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for page and document requests, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for the header-only probe of a spec link, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Unset or "crawler" for the specfetch agent, "impersonate" for the
    /// same Chrome string the renderer sends, anything else verbatim.
    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,

    /// Visit the home page first to collect cookies and the anti-forgery token.
    #[serde(default = "default_warm_up")]
    pub warm_up: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_user_agent() -> Option<String> {
    Some("impersonate".to_string())
}

fn default_warm_up() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
            warm_up: default_warm_up(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
