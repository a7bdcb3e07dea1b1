//! HTTP session shared by the renderer fallback, the spec-link probe and
//! the downloader.

mod config;
mod response;
mod user_agent;

pub use config::HttpConfig;
pub use response::{HeadResponse, HttpResponse};
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENT, CRAWLER_USER_AGENT};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};

/// Header carrying the site's anti-forgery token after warm-up.
const VERIFICATION_HEADER: &str = "RequestVerificationToken";

/// HTTP client with a cookie jar and optional anti-forgery token.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    probe_timeout: Duration,
    verification_token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client. `referer` is sent with every request.
    pub fn new(config: &HttpConfig, referer: Option<&str>) -> Result<Self> {
        let user_agent = resolve_user_agent(config.user_agent.as_deref());

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/pdf,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Some(referer) = referer {
            let value = HeaderValue::from_str(referer)
                .map_err(|e| ScrapeError::Config(format!("invalid referer {}: {}", referer, e)))?;
            headers.insert(REFERER, value);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            probe_timeout: config.probe_timeout(),
            verification_token: None,
        })
    }

    /// The anti-forgery token captured during warm-up, if any.
    pub fn verification_token(&self) -> Option<&str> {
        self.verification_token.as_deref()
    }

    /// Visit the site's home page to pick up session cookies and the
    /// anti-forgery token later requests must carry.
    pub async fn warm_up(&mut self, base_url: &str) -> Result<()> {
        let response = self.request(Method::GET, base_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: base_url.to_string(),
            });
        }

        let body = response.text().await?;
        self.verification_token = extract_verification_token(&body);
        info!(
            "Session initialized (verification token: {})",
            if self.verification_token.is_some() {
                "found"
            } else {
                "none"
            }
        );
        Ok(())
    }

    /// Header-only probe with the short probe timeout.
    ///
    /// Servers that refuse HEAD are probed with a GET whose body is dropped
    /// unread.
    pub async fn head(&self, url: &str) -> std::result::Result<HeadResponse, reqwest::Error> {
        let response = self
            .request(Method::HEAD, url)
            .timeout(self.probe_timeout)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            debug!("HEAD rejected by {}, probing with GET", url);
            let response = self
                .request(Method::GET, url)
                .timeout(self.probe_timeout)
                .send()
                .await?;
            return Ok(HeadResponse::new(&response));
        }

        Ok(HeadResponse::new(&response))
    }

    /// Streaming GET.
    pub async fn get(&self, url: &str) -> std::result::Result<HttpResponse, reqwest::Error> {
        let response = self.request(Method::GET, url).send().await?;
        Ok(HttpResponse::new(response))
    }

    /// GET a page as text. Non-2xx statuses are errors.
    /// Returns `(final_url, body)`.
    pub async fn get_text(&self, url: &str) -> Result<(String, String)> {
        let response = self.get(url).await?;
        if !response.is_success() {
            warn!("HTTP {} for {}", response.status.as_u16(), url);
            return Err(ScrapeError::HttpStatus {
                status: response.status.as_u16(),
                url: url.to_string(),
            });
        }
        let final_url = response.final_url.clone();
        let body = response.text().await?;
        Ok((final_url, body))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.verification_token {
            Some(token) => builder.header(VERIFICATION_HEADER, token),
            None => builder,
        }
    }
}

/// Find the `__RequestVerificationToken` hidden input in a page.
pub fn extract_verification_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"input[name="__RequestVerificationToken"]"#).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("value"))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
