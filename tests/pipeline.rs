//! End-to-end runs against a local catalog fixture.

mod common;

use tokio::sync::mpsc;

use common::{
    files_with_prefix, listing_page, minimal_pdf, product_page, settings_for, FixtureSite,
    FLOOR_DRAINS_PATH,
};
use specfetch::models::FailureStage;
use specfetch::services::{CategorySelection, ProductResult, RunContext, RunEvent, RunOrchestrator};
use specfetch::ScrapeError;

const FD_100: &str = "/products/drainage-solutions/fd-100";

async fn single_product_site(spec_href: &str) -> FixtureSite {
    FixtureSite::start(vec![
        (FLOOR_DRAINS_PATH, listing_page(&[FD_100])),
        (FD_100, product_page("FD-100", spec_href)),
    ])
    .await
}

#[tokio::test]
async fn test_floor_drain_is_downloaded() {
    let listing = format!(
        r#"<html><body>
<div class="product-tile" data-model-number="FD-100">
  <a href="{path}">Floor drain</a>
</div>
</body></html>"#,
        path = FD_100
    );
    let site = FixtureSite::start(vec![
        (FLOOR_DRAINS_PATH, listing),
        (FD_100, product_page("FD-100", "/spec/fd-100.pdf")),
    ])
    .await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let report = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();

    assert!(!report.has_failures(), "{:?}", report.failures);
    assert_eq!(report.stats.categories_processed, 1);
    assert_eq!(report.stats.products_found, 1);
    assert_eq!(report.stats.specs_resolved, 1);
    assert_eq!(report.stats.downloads_succeeded, 1);

    let expected = root
        .path()
        .join("specs")
        .join("Floor & Area Drains")
        .join("fd-100.pdf");
    assert_eq!(std::fs::read(&expected).unwrap(), minimal_pdf());
    assert_eq!(site.hits.pdf(), 1);
}

#[tokio::test]
async fn test_second_run_skips_existing_files() {
    let site = single_product_site("/spec/fd-100.pdf").await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let first = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();
    assert_eq!(first.stats.downloads_succeeded, 1);

    let second = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();
    assert_eq!(second.stats.downloads_succeeded, 0);
    assert_eq!(second.stats.downloads_skipped, 1);
    assert_eq!(second.stats.downloads_failed, 0);
    // The product page is not even resolved again.
    assert_eq!(second.stats.specs_resolved, 0);
    assert_eq!(site.hits.pdf(), 1);
}

#[tokio::test]
async fn test_product_found_by_every_strategy_is_processed_once() {
    let listing = format!(
        r#"<html><body>
<div data-model-number="FD-100"><a href="{path}">FD-100 Floor Drain</a></div>
<div class="grid-item">
  <a class="grid-item__link" href="{path}"><h3 class="grid-item__heading">FD-100</h3></a>
  <p class="grid-item__paragraph">Cast iron floor drain</p>
</div>
<a href="{path}">More</a>
<p>Also see FD-100 in the catalog.</p>
</body></html>"#,
        path = FD_100
    );
    let site = FixtureSite::start(vec![
        (FLOOR_DRAINS_PATH, listing),
        (FD_100, product_page("FD-100", "/spec/fd-100.pdf")),
    ])
    .await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let report = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();

    assert_eq!(report.stats.products_found, 1);
    assert_eq!(report.stats.downloads_succeeded, 1);
    assert_eq!(site.hits.pdf(), 1);
}

#[tokio::test]
async fn test_embedded_data_is_used_when_no_links_exist() {
    let listing = r#"<html><body>
<div id="app"></div>
<script type="application/json">{"products":[{"model":"RD-200","name":"Roof drain"}]}</script>
</body></html>"#
        .to_string();
    let rd_200 = "/products/drainage-solutions/rd-200";
    let site = FixtureSite::start(vec![
        (FLOOR_DRAINS_PATH, listing),
        (rd_200, product_page("RD-200", "/spec/rd-200.pdf")),
    ])
    .await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let report = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();

    assert!(!report.has_failures(), "{:?}", report.failures);
    assert_eq!(report.stats.products_found, 1);
    assert!(root
        .path()
        .join("specs")
        .join("Floor & Area Drains")
        .join("rd-200.pdf")
        .exists());
}

#[tokio::test]
async fn test_unverified_link_is_not_downloaded() {
    let site = single_product_site("/wrong/fd-100.pdf").await;
    let root = tempfile::tempdir().unwrap();
    let settings = settings_for(&site, root.path());
    let orchestrator = RunOrchestrator::new(settings.clone()).unwrap();

    let mut ctx = RunContext::open(&settings).await.unwrap();
    let resolution = orchestrator
        .resolver()
        .resolve(&mut ctx, &site.url(FD_100))
        .await;
    ctx.close().await;

    assert_eq!(resolution.spec_url, None);
    assert!(!resolution.verified);
    let failure = resolution.failure.unwrap();
    assert_eq!(failure.stage, FailureStage::SpecResolution);
    assert!(failure.reason.contains("text/html"), "{}", failure.reason);
    assert!(!files_with_prefix(&root.path().join("debug"), "debug_product_page_").is_empty());

    let report = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();
    assert_eq!(report.stats.specs_resolved, 0);
    assert_eq!(report.stats.downloads_succeeded, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(!orchestrator
        .layout()
        .category_dir("Floor & Area Drains")
        .join("fd-100.pdf")
        .exists());
}

#[tokio::test]
async fn test_transient_download_failure_exhausts_retries() {
    let site = single_product_site("/flaky/fd-100.pdf").await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let report = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();

    assert_eq!(site.hits.flaky(), 3);
    assert_eq!(report.stats.specs_resolved, 1);
    assert_eq!(report.stats.downloads_failed, 1);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.stage, FailureStage::Download);
    assert!(failure.transient);
    assert!(failure.reason.contains("503"));

    let dir = orchestrator.layout().category_dir("Floor & Area Drains");
    assert!(!dir.join("fd-100.pdf").exists());
    assert!(files_with_prefix(&dir, ".specfetch-").is_empty());
}

#[tokio::test]
async fn test_out_of_range_category_index_is_rejected() {
    let site = FixtureSite::start(vec![]).await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let err = orchestrator
        .execute(&CategorySelection::Index(99))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScrapeError::CategoryIndexOutOfRange { index: 99, .. }
    ));
}

#[tokio::test]
async fn test_unreachable_categories_are_reported_not_fatal() {
    // Nothing is served, so every listing page is a 404.
    let site = FixtureSite::start(vec![]).await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let report = orchestrator
        .execute(&CategorySelection::Names(vec![
            "Floor & Area Drains".to_string(),
            "Roof Drains".to_string(),
        ]))
        .await
        .unwrap();

    assert_eq!(report.stats.categories_processed, 2);
    assert_eq!(report.stats.products_found, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|f| f.stage == FailureStage::LinkDiscovery && f.reason.contains("404")));
    // Render failures leave no page source behind.
    assert!(files_with_prefix(&root.path().join("debug"), "debug_page_source_").is_empty());
}

#[tokio::test]
async fn test_empty_listing_saves_page_source() {
    let site = FixtureSite::start(vec![(
        FLOOR_DRAINS_PATH,
        "<html><body><p>Coming soon</p></body></html>".to_string(),
    )])
    .await;
    let root = tempfile::tempdir().unwrap();
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path())).unwrap();

    let report = orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();

    assert_eq!(report.stats.products_found, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].reason, "no candidates found");
    assert_eq!(
        files_with_prefix(&root.path().join("debug"), "debug_page_source_").len(),
        1
    );
}

#[tokio::test]
async fn test_events_follow_pipeline_order() {
    let site = single_product_site("/spec/fd-100.pdf").await;
    let root = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::channel::<RunEvent>(100);
    let orchestrator = RunOrchestrator::new(settings_for(&site, root.path()))
        .unwrap()
        .with_events(tx);

    orchestrator
        .execute(&CategorySelection::Index(0))
        .await
        .unwrap();
    drop(orchestrator);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 4);
    assert!(matches!(&events[0], RunEvent::CategoryStarted { index: 0, total: 1, .. }));
    assert!(matches!(&events[1], RunEvent::CandidatesFound { count: 1, .. }));
    assert!(matches!(
        &events[2],
        RunEvent::ProductFinished { model_code, result: ProductResult::Downloaded { .. }, .. }
            if model_code == "FD-100"
    ));
    assert!(matches!(
        &events[3],
        RunEvent::CategoryFinished { stats, .. } if stats.downloads_succeeded == 1
    ));
}
