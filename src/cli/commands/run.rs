//! Run command: the full crawl.

use std::path::PathBuf;

use console::style;
use tokio::sync::mpsc;

use crate::cli::progress::{print_summary, RunProgress};
use crate::config::Settings;
use crate::services::{CategorySelection, RunEvent, RunOrchestrator};

pub async fn cmd_run(
    mut settings: Settings,
    selection: CategorySelection,
    output: Option<PathBuf>,
    no_browser: bool,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = output {
        settings.output_dir = dir;
    }
    if no_browser {
        settings.browser.enabled = false;
    }

    println!(
        "{} Saving spec sheets under {}",
        style("→").cyan(),
        settings.output_dir.display()
    );

    // Event channel for progress updates
    let (event_tx, mut event_rx) = mpsc::channel::<RunEvent>(100);
    let orchestrator = RunOrchestrator::new(settings)?.with_events(event_tx);

    let show_progress = !json;
    let event_handler = tokio::spawn(async move {
        let progress = show_progress.then(RunProgress::new);
        while let Some(event) = event_rx.recv().await {
            if let Some(ref progress) = progress {
                progress.handle(event);
            }
        }
        if let Some(progress) = progress {
            progress.finish();
        }
    });

    let result = orchestrator.execute(&selection).await;
    // Dropping the orchestrator closes the channel and ends the handler.
    drop(orchestrator);
    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }

    let report = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}
