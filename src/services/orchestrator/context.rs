//! Per-run resources: render session, HTTP session, pacing, diagnostics.

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::scrapers::browser::{create_renderer, PageRenderer};
use crate::scrapers::rate_limiter::RateLimiter;
use crate::scrapers::HttpClient;
use crate::services::diagnostics::DiagnosticSink;

/// Resources held for the lifetime of one run and used by one actor.
///
/// Call [`RunContext::close`] when done; it releases the renderer (and any
/// browser process it owns).
pub struct RunContext {
    pub renderer: Box<dyn PageRenderer>,
    pub http: HttpClient,
    pub limiter: RateLimiter,
    pub diagnostics: DiagnosticSink,
    /// Set once the cookie banner has been looked for.
    pub consent_checked: bool,
}

impl RunContext {
    /// Open the HTTP session (warming it up if configured) and the renderer.
    pub async fn open(settings: &Settings) -> Result<Self> {
        let referer = format!("{}/", settings.base_url.trim_end_matches('/'));
        let mut http = HttpClient::new(&settings.http, Some(&referer))?;

        if settings.http.warm_up {
            if let Err(e) = http.warm_up(&settings.base_url).await {
                warn!("Session warm-up failed, continuing without it: {}", e);
            }
        }

        let renderer = create_renderer(&settings.browser, http.clone());
        info!("Using {} renderer", renderer.name());

        Ok(Self::from_parts(
            renderer,
            http,
            RateLimiter::new(settings.rate_limit.clone()),
            DiagnosticSink::new(settings.diagnostics_dir.clone()),
        ))
    }

    /// Assemble a context from existing parts.
    pub fn from_parts(
        renderer: Box<dyn PageRenderer>,
        http: HttpClient,
        limiter: RateLimiter,
        diagnostics: DiagnosticSink,
    ) -> Self {
        Self {
            renderer,
            http,
            limiter,
            diagnostics,
            consent_checked: false,
        }
    }

    /// Tear down the render session.
    pub async fn close(mut self) {
        if let Err(e) = self.renderer.close().await {
            warn!("Failed to close {} renderer: {}", self.renderer.name(), e);
        }
    }
}
