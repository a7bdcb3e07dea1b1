//! Resolve command: one product page, no download.

use console::style;

use crate::config::Settings;
use crate::scrapers::SpecSheetResolver;
use crate::services::RunContext;

pub async fn cmd_resolve(
    mut settings: Settings,
    product_url: &str,
    no_browser: bool,
) -> anyhow::Result<()> {
    if no_browser {
        settings.browser.enabled = false;
    }
    let resolver = SpecSheetResolver::new(settings.resolution.clone())?;

    let mut ctx = RunContext::open(&settings).await?;
    let resolution = resolver.resolve(&mut ctx, product_url).await;
    ctx.close().await;

    match (resolution.accepted_url(), &resolution.failure) {
        (Some(spec_url), _) => {
            println!("{} {}", style("✓").green(), spec_url);
        }
        (None, failure) => {
            let reason = failure
                .as_ref()
                .map(|f| f.reason.as_str())
                .unwrap_or("no specification link found");
            println!("{} No verified spec sheet: {}", style("✗").red(), reason);
        }
    }
    Ok(())
}
