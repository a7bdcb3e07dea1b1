//! Plain-HTTP renderer.
//!
//! Fetches server-delivered markup and answers locator queries against it.
//! Nothing is executed, so accordion clicks cannot reveal new content; the
//! resolver's cascades still run and fall through to the generic anchors.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::locator::{attribute_static, find_static};
use super::{ElementHandle, Locator, PageRenderer, RenderError, RenderedPage, WaitCondition, WaitOutcome};
use crate::error::ScrapeError;
use crate::scrapers::http_client::HttpClient;

/// Renderer backed by the HTTP session.
pub struct HttpRenderer {
    http: HttpClient,
    current: Option<RenderedPage>,
}

impl HttpRenderer {
    pub fn new(http: HttpClient) -> Self {
        Self { http, current: None }
    }

    fn page(&self) -> Result<&RenderedPage, RenderError> {
        self.current.as_ref().ok_or(RenderError::NoPage)
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        self.current = None;
        let (final_url, html) = self.http.get_text(url).await.map_err(|e| {
            let transient = e.is_transient();
            let reason = match e {
                ScrapeError::HttpStatus { status, .. } => format!("HTTP {}", status),
                other => other.to_string(),
            };
            RenderError::Navigation {
                url: url.to_string(),
                reason,
                transient,
            }
        })?;

        let page = RenderedPage {
            url: url.to_string(),
            final_url,
            html,
        };
        self.current = Some(page.clone());
        Ok(page)
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        _timeout: Duration,
    ) -> Result<WaitOutcome, RenderError> {
        // Static markup never changes, so one look is as good as a wait.
        let page = self.page()?;
        Ok(match find_static(&page.html, locator, condition)? {
            Some(index) => WaitOutcome::Found(ElementHandle::new(locator.clone(), index)),
            None => WaitOutcome::TimedOut,
        })
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), RenderError> {
        self.page()?;
        debug!("Static renderer cannot click {}; ignoring", handle);
        Ok(())
    }

    async fn select_option(&mut self, handle: &ElementHandle, value: &str) -> Result<(), RenderError> {
        self.page()?;
        debug!("Static renderer cannot select '{}' on {}; ignoring", value, handle);
        Ok(())
    }

    async fn attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        let page = self.page()?;
        attribute_static(&page.html, handle, name)
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, RenderError> {
        self.page().cloned()
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.current = None;
        Ok(())
    }
}
