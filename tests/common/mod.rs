//! Shared fixtures: a local catalog site and settings that point at it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use specfetch::scrapers::RateLimitConfig;
use specfetch::Settings;

pub const FLOOR_DRAINS_PATH: &str =
    "/products/drainage-solutions/floor-drains-channels-trench/floor-area-drains";

/// Two-object PDF with a correct cross-reference table.
pub fn minimal_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [] /Count 0 >>",
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(b"xref\n0 3\n0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!("trailer\n<< /Size 3 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n", xref).as_bytes(),
    );
    pdf
}

/// Request counters for the document routes.
#[derive(Default)]
pub struct Hits {
    pub pdf: AtomicUsize,
    pub flaky: AtomicUsize,
}

impl Hits {
    pub fn pdf(&self) -> usize {
        self.pdf.load(Ordering::SeqCst)
    }

    pub fn flaky(&self) -> usize {
        self.flaky.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct SiteState {
    pages: Arc<HashMap<String, String>>,
    hits: Arc<Hits>,
}

/// A catalog served from 127.0.0.1.
///
/// - `/spec/{name}` answers with a valid PDF.
/// - `/wrong/{name}` answers with an HTML page.
/// - `/flaky/{name}` answers HEAD with PDF headers and GET with 503.
/// - Any other path is looked up in the page map, else 404.
pub struct FixtureSite {
    pub base_url: String,
    pub hits: Arc<Hits>,
}

impl FixtureSite {
    pub async fn start(pages: Vec<(&str, String)>) -> Self {
        let hits = Arc::new(Hits::default());
        let state = SiteState {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(path, html)| (path.to_string(), html))
                    .collect(),
            ),
            hits: hits.clone(),
        };

        let app = Router::new()
            .route("/spec/:name", get(pdf_get).head(pdf_head))
            .route("/wrong/:name", get(wrong_type))
            .route("/flaky/:name", get(flaky_get).head(pdf_head))
            .fallback(page)
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn pdf_get(State(state): State<SiteState>, UrlPath(_name): UrlPath<String>) -> Response {
    state.hits.pdf.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "application/pdf")], minimal_pdf()).into_response()
}

async fn pdf_head(UrlPath(_name): UrlPath<String>) -> Response {
    ([(header::CONTENT_TYPE, "application/pdf")], ()).into_response()
}

async fn wrong_type(UrlPath(_name): UrlPath<String>) -> Response {
    Html("<html><body>Sign in to download</body></html>").into_response()
}

async fn flaky_get(State(state): State<SiteState>, UrlPath(_name): UrlPath<String>) -> Response {
    state.hits.flaky.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

async fn page(State(state): State<SiteState>, uri: Uri) -> Response {
    match state.pages.get(uri.path()) {
        Some(html) => Html(html.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Product page whose download panel links to `href`.
pub fn product_page(model_code: &str, href: &str) -> String {
    format!(
        r#"<html><body>
<h1>{code} Floor Drain</h1>
<button class="js-accordion__trigger" type="button">Specifications</button>
<div class="product-downloads">
  <a class="product-download__link" href="{href}">Specification Sheet</a>
  <a class="product-download__link" href="/docs/install.pdf">Installation</a>
</div>
</body></html>"#,
        code = model_code,
        href = href
    )
}

/// Listing page with one plain anchor per product path.
pub fn listing_page(product_paths: &[&str]) -> String {
    let links: String = product_paths
        .iter()
        .map(|path| format!(r#"<li><a href="{}">View product</a></li>"#, path))
        .collect();
    format!(
        "<html><body><h1>Floor &amp; Area Drains</h1><ul>{}</ul></body></html>",
        links
    )
}

/// Settings for a fast run against `site`: no pacing, no retry delay, no
/// browser, output and diagnostics under `root`.
pub fn settings_for(site: &FixtureSite, root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.base_url = site.base_url.clone();
    settings.output_dir = root.join("specs");
    settings.diagnostics_dir = Some(root.join("debug"));
    settings.rate_limit = RateLimitConfig::disabled();
    settings.retry.delay_secs = 0.0;
    settings.http.warm_up = false;
    settings.browser.enabled = false;
    settings.extraction.page_size = None;
    settings.resolution.settle_ms = 0;
    settings.resolution.wait_timeout_ms = 0;
    settings.resolution.link_wait_ms = 0;
    settings.resolution.consent_wait_ms = 0;
    settings
}

/// Files in `dir` whose names start with `prefix`.
pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with(prefix))
                .collect()
        })
        .unwrap_or_default()
}
