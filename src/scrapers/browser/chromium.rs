//! Chrome-backed renderer (CDP via chromiumoxide).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, BrowserConfig as ChromeConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::locator::{attribute_script, click_script, find_script, select_option_script};
use super::{
    BrowserConfig, ElementHandle, Locator, PageRenderer, RenderError, RenderedPage, WaitCondition,
    WaitOutcome,
};
use crate::scrapers::http_client::BROWSER_USER_AGENT;

/// JavaScript to wait for page ready state.
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete') {
            resolve(document.readyState);
        } else {
            window.addEventListener('load', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Scroll to the bottom and report the new document height.
const SCROLL_SCRIPT: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return document.body.scrollHeight; })()";

/// Renderer driving a launched or remote Chrome instance.
pub struct BrowserRenderer {
    config: BrowserConfig,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Option<Page>,
}

impl BrowserRenderer {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: None,
            handler: None,
            page: None,
        }
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<PathBuf, RenderError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(RenderError::Unavailable(
            "Chrome/Chromium not found; install it, set browser.remote_url, \
             or disable the browser with --no-browser"
                .to_string(),
        ))
    }

    /// Launch or connect to browser if not already running.
    async fn ensure_browser(&mut self) -> Result<(), RenderError> {
        if self.browser.is_some() {
            return Ok(());
        }

        if let Some(remote_url) = self.config.remote_url.clone() {
            return self.connect_remote(&remote_url).await;
        }

        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = ChromeConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        let (width, height) = self.config.window_size;
        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg(format!("--window-size={},{}", width, height));

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| RenderError::Unavailable(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to launch browser: {}", e)))?;

        self.handler = Some(tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        }));
        self.browser = Some(browser);

        Ok(())
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&mut self, url: &str) -> Result<(), RenderError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let unavailable = |e: reqwest::Error| {
            RenderError::Unavailable(format!("remote browser at {}: {}", version_url, e))
        };
        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(self.config.page_timeout())
            .send()
            .await
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                RenderError::Unavailable("no webSocketDebuggerUrl in response".to_string())
            })?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: self.config.page_timeout(),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to connect: {}", e)))?;

        self.handler = Some(tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        }));
        self.browser = Some(browser);

        Ok(())
    }

    /// Open the session's single page if it isn't open yet.
    async fn ensure_page(&mut self) -> Result<(), RenderError> {
        if self.page.is_some() {
            return Ok(());
        }
        self.ensure_browser().await?;

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Unavailable("browser not initialized".to_string()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to open page: {}", e)))?;

        let user_agent = BROWSER_USER_AGENT.to_string();
        if let Err(e) = page.execute(SetUserAgentOverrideParams::new(user_agent)).await {
            debug!("Could not override user agent: {}", e);
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, RenderError> {
        self.page.as_ref().ok_or(RenderError::NoPage)
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, RenderError> {
        self.page()?
            .evaluate(script)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    /// Navigate to a URL with timeout handling.
    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: format!("invalid URL: {}", e),
                transient: false,
            })?;

        let timeout = self.config.page_timeout();
        let response = tokio::time::timeout(timeout, self.page()?.execute(nav_params))
            .await
            .map_err(|_| RenderError::Timeout {
                target: url.to_string(),
                timeout,
            })?
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
                transient: true,
            })?;

        if let Some(error_text) = response.result.error_text.clone() {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                reason: error_text,
                transient: true,
            });
        }
        Ok(())
    }

    /// Wait for the page to reach a ready state.
    async fn wait_for_ready(&self) {
        match tokio::time::timeout(
            self.config.page_timeout(),
            self.eval::<String>(WAIT_FOR_READY_SCRIPT.to_string()),
        )
        .await
        {
            Ok(Ok(state)) => debug!("Page ready state: {}", state),
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }
    }

    /// Scroll to the bottom until the document stops growing.
    async fn scroll_to_bottom(&self) {
        let pause = Duration::from_millis(self.config.scroll_pause_ms);
        let mut last_height: i64 = -1;
        for _ in 0..self.config.scroll_passes {
            match self.eval::<i64>(SCROLL_SCRIPT.to_string()).await {
                Ok(height) if height == last_height => break,
                Ok(height) => last_height = height,
                Err(e) => {
                    debug!("Scroll failed: {}", e);
                    break;
                }
            }
            tokio::time::sleep(pause).await;
        }
    }

    async fn current_page(&self, requested: &str) -> Result<RenderedPage, RenderError> {
        let page = self.page()?;
        let final_url = page
            .url()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .unwrap_or_else(|| requested.to_string());
        let html = page
            .content()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;
        Ok(RenderedPage {
            url: requested.to_string(),
            final_url,
            html,
        })
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        self.ensure_page().await?;
        self.navigate(url).await?;
        self.wait_for_ready().await;
        self.scroll_to_bottom().await;
        self.current_page(url).await
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<WaitOutcome, RenderError> {
        self.page()?;
        let script = find_script(locator, condition);
        let deadline = Instant::now() + timeout;
        let poll = self.config.poll_interval();

        loop {
            match self.eval::<i64>(script.clone()).await {
                Ok(index) if index >= 0 => {
                    return Ok(WaitOutcome::Found(ElementHandle::new(
                        locator.clone(),
                        index as usize,
                    )));
                }
                Ok(_) => {}
                // The document may be mid-update; keep polling until the deadline.
                Err(e) => debug!("Locator check for {} failed: {}", locator, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), RenderError> {
        if self.eval::<bool>(click_script(handle)).await? {
            Ok(())
        } else {
            Err(RenderError::StaleElement(handle.to_string()))
        }
    }

    async fn select_option(&mut self, handle: &ElementHandle, value: &str) -> Result<(), RenderError> {
        if self.eval::<bool>(select_option_script(handle, value)).await? {
            Ok(())
        } else {
            Err(RenderError::StaleElement(handle.to_string()))
        }
    }

    async fn attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        let (value, exists): (Option<String>, bool) =
            self.eval(attribute_script(handle, name)).await?;
        if exists {
            Ok(value)
        } else {
            Err(RenderError::StaleElement(handle.to_string()))
        }
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, RenderError> {
        let url = self
            .page()?
            .url()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .unwrap_or_default();
        self.current_page(&url).await
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if self.config.remote_url.is_none() {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                let _ = browser.wait().await;
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        Ok(())
    }
}

impl Drop for BrowserRenderer {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
