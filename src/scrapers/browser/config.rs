//! Browser renderer configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Render pages in Chrome. When false (or when built without the
    /// `browser` feature) pages are fetched over plain HTTP instead.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Browser window size as (width, height).
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// Scroll-to-bottom passes after load, for lazily loaded grids.
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: u32,

    /// Pause after each scroll pass, in milliseconds.
    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    /// Interval between element checks while waiting, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}

fn default_window_size() -> (u32, u32) {
    (1920, 1080)
}

fn default_scroll_passes() -> u32 {
    3
}

fn default_scroll_pause_ms() -> u64 {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            headless: default_headless(),
            timeout: default_timeout(),
            chrome_args: Vec::new(),
            remote_url: None,
            window_size: default_window_size(),
            scroll_passes: default_scroll_passes(),
            scroll_pause_ms: default_scroll_pause_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl BrowserConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SPECFETCH_BROWSER_URL") {
            if !url.trim().is_empty() {
                self.remote_url = Some(url);
            }
        }
        if let Ok(value) = std::env::var("SPECFETCH_HEADLESS") {
            self.headless = !matches!(value.to_lowercase().as_str(), "0" | "false" | "no");
        }
        self
    }
}
