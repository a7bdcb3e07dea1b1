//! specfetch - crawl a product catalog and archive its specification sheets.

use std::sync::Mutex;

use specfetch::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "specfetch=info"
    } else {
        "specfetch=warn"
    };

    let file_layer = match cli::log_file_path() {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(env_filter("specfetch=info")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter(default_filter)))
        .with(file_layer)
        .init();

    // Run CLI
    cli::run().await
}
