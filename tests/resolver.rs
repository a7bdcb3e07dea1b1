//! Resolution cascades driven by a scripted renderer.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use common::{files_with_prefix, FixtureSite};
use specfetch::models::FailureStage;
use specfetch::scrapers::browser::{
    ElementHandle, Locator, PageRenderer, RenderError, RenderedPage, WaitCondition, WaitOutcome,
};
use specfetch::scrapers::{
    HttpClient, HttpConfig, RateLimitConfig, RateLimiter, ResolutionConfig, SpecSheetResolver,
};
use specfetch::services::{DiagnosticSink, RunContext};

const PRODUCT_PATH: &str = "/products/drainage-solutions/fd-100";

/// How a scripted element responds.
#[derive(Debug, Clone)]
enum Element {
    /// `wait_for` fails with a script error.
    Broken,
    /// Present; clicking it does nothing.
    Button,
    /// Present; clicking it reveals hidden links.
    Toggle,
    Link { href: &'static str, hidden: bool },
}

#[derive(Default)]
struct Page {
    elements: Vec<(Locator, Element)>,
    expanded: bool,
    log: Vec<String>,
}

impl Page {
    fn lookup(&self, locator: &Locator) -> Option<Element> {
        self.elements
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, e)| e.clone())
    }
}

/// Renderer that answers from a fixed element script and records every call.
struct ScriptedRenderer {
    page: Arc<Mutex<Page>>,
    current: Option<String>,
}

impl ScriptedRenderer {
    fn new(elements: Vec<(Locator, Element)>) -> (Self, Arc<Mutex<Page>>) {
        let page = Arc::new(Mutex::new(Page {
            elements,
            ..Page::default()
        }));
        let renderer = Self {
            page: page.clone(),
            current: None,
        };
        (renderer, page)
    }

    fn snapshot_of(&self, url: &str) -> RenderedPage {
        RenderedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            html: "<html><body><h1>FD-100</h1></body></html>".to_string(),
        }
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        let mut page = self.page.lock().unwrap();
        page.expanded = false;
        page.log.push(format!("render {}", url));
        self.current = Some(url.to_string());
        Ok(self.snapshot_of(url))
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        _condition: WaitCondition,
        _timeout: Duration,
    ) -> Result<WaitOutcome, RenderError> {
        let mut page = self.page.lock().unwrap();
        page.log.push(format!("wait {}", locator.css));
        let found = WaitOutcome::Found(ElementHandle::new(locator.clone(), 0));
        match page.lookup(locator) {
            None => Ok(WaitOutcome::TimedOut),
            Some(Element::Broken) => Err(RenderError::Script("locate threw".to_string())),
            Some(Element::Link { hidden: true, .. }) if !page.expanded => Ok(WaitOutcome::TimedOut),
            Some(_) => Ok(found),
        }
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<(), RenderError> {
        let mut page = self.page.lock().unwrap();
        page.log.push(format!("click {}", handle.locator.css));
        if let Some(Element::Toggle) = page.lookup(&handle.locator) {
            page.expanded = true;
        }
        Ok(())
    }

    async fn select_option(
        &mut self,
        _handle: &ElementHandle,
        _value: &str,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    async fn attribute(
        &mut self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        let page = self.page.lock().unwrap();
        match page.lookup(&handle.locator) {
            Some(Element::Link { href, .. }) if name == "href" => Ok(Some(href.to_string())),
            _ => Ok(None),
        }
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, RenderError> {
        match &self.current {
            Some(url) => Ok(self.snapshot_of(url)),
            None => Err(RenderError::NoPage),
        }
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.current = None;
        Ok(())
    }
}

fn context(renderer: ScriptedRenderer, diagnostics: DiagnosticSink) -> RunContext {
    let http = HttpClient::new(&HttpConfig::default(), None).unwrap();
    RunContext::from_parts(
        Box::new(renderer),
        http,
        RateLimiter::new(RateLimitConfig::disabled()),
        diagnostics,
    )
}

fn resolver(expand: &[&Locator], links: &[&Locator], consent: Option<Locator>) -> SpecSheetResolver {
    SpecSheetResolver::new(ResolutionConfig {
        expand_cascade: expand.iter().map(|l| (*l).clone()).collect(),
        link_cascade: links.iter().map(|l| (*l).clone()).collect(),
        wait_timeout_ms: 0,
        link_wait_ms: 0,
        settle_ms: 0,
        consent_wait_ms: 0,
        cookie_consent: consent,
        ..ResolutionConfig::default()
    })
    .unwrap()
}

fn log_of(page: &Arc<Mutex<Page>>) -> Vec<String> {
    page.lock().unwrap().log.clone()
}

#[tokio::test]
async fn test_link_revealed_by_expanding_panel() {
    let site = FixtureSite::start(vec![]).await;
    let broken = Locator::css("button.broken");
    let missing = Locator::css("button.missing");
    let toggle = Locator::css("button.specs-toggle").with_text("Specifications");
    let sheet = Locator::css("a.spec-sheet");
    let any_pdf = Locator::css("a[href*='.pdf']");

    let (renderer, page) = ScriptedRenderer::new(vec![
        (broken.clone(), Element::Broken),
        (toggle.clone(), Element::Toggle),
        (
            sheet.clone(),
            Element::Link {
                href: "/spec/fd-100.pdf",
                hidden: true,
            },
        ),
        (
            any_pdf.clone(),
            Element::Link {
                href: "/docs/install.pdf",
                hidden: false,
            },
        ),
    ]);
    let mut ctx = context(renderer, DiagnosticSink::disabled());
    let resolver = resolver(&[&broken, &missing, &toggle], &[&sheet, &any_pdf], None);

    let resolution = resolver.resolve(&mut ctx, &site.url(PRODUCT_PATH)).await;

    assert!(resolution.verified, "{:?}", resolution.failure);
    assert_eq!(resolution.spec_url, Some(site.url("/spec/fd-100.pdf")));

    let log = log_of(&page);
    let expected_prefix = [
        format!("render {}", site.url(PRODUCT_PATH)),
        "wait button.broken".to_string(),
        "wait button.missing".to_string(),
        "wait button.specs-toggle".to_string(),
        "click button.specs-toggle".to_string(),
        "wait a.spec-sheet".to_string(),
    ];
    assert_eq!(&log[..expected_prefix.len()], &expected_prefix);
    // First match wins: the generic fallback is never consulted.
    assert!(!log.iter().any(|entry| entry.contains(".pdf']")), "{:?}", log);
    ctx.close().await;
}

#[tokio::test]
async fn test_failing_link_locator_falls_through() {
    let site = FixtureSite::start(vec![]).await;
    let broken_link = Locator::css("a.broken");
    let sheet = Locator::css("a.spec-sheet");

    let (renderer, page) = ScriptedRenderer::new(vec![
        (broken_link.clone(), Element::Broken),
        (
            sheet.clone(),
            Element::Link {
                href: "/spec/fd-100.pdf",
                hidden: false,
            },
        ),
    ]);
    let mut ctx = context(renderer, DiagnosticSink::disabled());
    let resolver = resolver(&[&Locator::css("button.missing")], &[&broken_link, &sheet], None);

    let resolution = resolver.resolve(&mut ctx, &site.url(PRODUCT_PATH)).await;

    assert!(resolution.verified);
    assert_eq!(resolution.spec_url, Some(site.url("/spec/fd-100.pdf")));
    assert!(!log_of(&page).iter().any(|entry| entry.starts_with("click")));
}

#[tokio::test]
async fn test_hidden_link_without_working_control_is_not_found() {
    let site = FixtureSite::start(vec![]).await;
    let root = tempfile::tempdir().unwrap();
    let broken = Locator::css("button.broken");
    let sheet = Locator::css("a.spec-sheet");

    let (renderer, _page) = ScriptedRenderer::new(vec![
        (broken.clone(), Element::Broken),
        (
            sheet.clone(),
            Element::Link {
                href: "/spec/fd-100.pdf",
                hidden: true,
            },
        ),
    ]);
    let mut ctx = context(renderer, DiagnosticSink::new(Some(root.path().to_path_buf())));
    let resolver = resolver(&[&broken], &[&sheet], None);

    let resolution = resolver.resolve(&mut ctx, &site.url(PRODUCT_PATH)).await;

    assert!(!resolution.verified);
    assert_eq!(resolution.spec_url, None);
    let failure = resolution.failure.unwrap();
    assert_eq!(failure.stage, FailureStage::SpecResolution);
    assert_eq!(failure.reason, "no specification link found");
    assert_eq!(files_with_prefix(root.path(), "debug_product_page_").len(), 1);
}

#[tokio::test]
async fn test_cookie_banner_is_dismissed_once_per_run() {
    let site = FixtureSite::start(vec![]).await;
    let consent = Locator::css("#accept-cookies");
    let sheet = Locator::css("a.spec-sheet");

    let (renderer, page) = ScriptedRenderer::new(vec![
        (consent.clone(), Element::Button),
        (
            sheet.clone(),
            Element::Link {
                href: "/spec/fd-100.pdf",
                hidden: false,
            },
        ),
    ]);
    let mut ctx = context(renderer, DiagnosticSink::disabled());
    let resolver = resolver(&[], &[&sheet], Some(consent));

    for _ in 0..2 {
        let resolution = resolver.resolve(&mut ctx, &site.url(PRODUCT_PATH)).await;
        assert!(resolution.verified);
    }

    let clicks = log_of(&page)
        .into_iter()
        .filter(|entry| entry == "click #accept-cookies")
        .count();
    assert_eq!(clicks, 1);
}
