//! Progress display and run summary for the terminal.

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::models::RunReport;
use crate::services::{ProductResult, RunEvent};
use crate::utils::{format_duration, format_size};

/// Two bars: categories, and products within the current category.
pub struct RunProgress {
    _multi: MultiProgress,
    categories: ProgressBar,
    products: ProgressBar,
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

impl RunProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        let categories = multi.add(ProgressBar::new(0));
        categories.set_style(bar_style(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} categories {msg}",
        ));
        let products = multi.add(ProgressBar::new(0));
        products.set_style(bar_style(
            "  [{bar:30.green/white}] {pos}/{len} products {msg}",
        ));
        Self {
            _multi: multi,
            categories,
            products,
        }
    }

    pub fn handle(&self, event: RunEvent) {
        match event {
            RunEvent::CategoryStarted { total, name, .. } => {
                self.categories.set_length(total as u64);
                self.categories.set_message(name);
                self.products.reset();
                self.products.set_length(0);
                self.products.set_message("discovering...");
            }
            RunEvent::CandidatesFound { category, count } => {
                self.products.set_length(count as u64);
                self.products.set_message("");
                if count == 0 {
                    self.categories.println(format!(
                        "{} No products found in {}",
                        style("!").yellow(),
                        category
                    ));
                }
            }
            RunEvent::ProductFinished {
                model_code, result, ..
            } => {
                self.products.inc(1);
                match result {
                    ProductResult::Downloaded { bytes } => {
                        self.products
                            .set_message(format!("{} ({})", model_code, format_size(bytes)));
                    }
                    ProductResult::AlreadyExists => self.products.set_message(model_code),
                    ProductResult::DownloadFailed { reason } => {
                        self.categories.println(format!(
                            "{} Failed to download {}: {}",
                            style("✗").red(),
                            model_code,
                            reason
                        ));
                    }
                    ProductResult::Unresolved { reason } => {
                        self.categories.println(format!(
                            "{} No spec sheet for {}: {}",
                            style("✗").red(),
                            model_code,
                            reason
                        ));
                    }
                }
            }
            RunEvent::CategoryFinished { .. } => self.categories.inc(1),
        }
    }

    pub fn finish(&self) {
        self.products.finish_and_clear();
        self.categories.finish_and_clear();
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Print counts, elapsed time and every recorded failure.
pub fn print_summary(report: &RunReport) {
    let stats = &report.stats;
    println!(
        "{} Run finished in {}",
        style("✓").green(),
        format_duration(report.elapsed)
    );
    println!("  Categories processed: {}", stats.categories_processed);
    println!("  Products found:       {}", stats.products_found);
    println!("  Specs resolved:       {}", stats.specs_resolved);
    println!("  Downloaded:           {}", stats.downloads_succeeded);
    if stats.downloads_skipped > 0 {
        println!(
            "  {} {} already on disk",
            style("→").dim(),
            stats.downloads_skipped
        );
    }
    println!("  Failed downloads:     {}", stats.downloads_failed);

    if report.has_failures() {
        println!();
        println!(
            "{} {} failure(s):",
            style("!").yellow(),
            report.failures.len()
        );
        for failure in &report.failures {
            println!("  {}", failure);
        }
    }
}
