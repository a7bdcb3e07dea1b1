//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod categories;
mod config_cmd;
mod resolve;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::services::CategorySelection;

#[derive(Parser)]
#[command(name = "specfetch")]
#[command(about = "Crawl a product catalog and download specification sheets")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to specfetch_<timestamp>.log in the current directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Log file to write when `--log-file` is given (for early logging setup).
pub fn log_file_path() -> Option<PathBuf> {
    if !std::env::args().any(|arg| arg == "--log-file") {
        return None;
    }
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    Some(PathBuf::from(format!("specfetch_{}.log", timestamp)))
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl categories, resolve spec sheets and download them
    Run {
        /// Process every category in table order (the default)
        #[arg(long, conflicts_with_all = ["category", "names"])]
        all: bool,

        /// Process a single category by index (see `specfetch categories`)
        #[arg(long)]
        category: Option<usize>,

        /// Process categories by name (repeatable)
        #[arg(long = "name", value_name = "NAME", conflicts_with = "category")]
        names: Vec<String>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetch pages over plain HTTP instead of rendering them in Chrome
        #[arg(long)]
        no_browser: bool,

        /// Print the run report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// List the category table with indices and listing URLs
    Categories,

    /// Resolve one product page to its spec-sheet URL
    Resolve {
        /// Product page URL
        product_url: String,

        /// Fetch the page over plain HTTP instead of rendering it in Chrome
        #[arg(long)]
        no_browser: bool,
    },

    /// Show the effective configuration as TOML
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Run {
            all: _,
            category,
            names,
            output,
            no_browser,
            json,
        } => {
            let selection = match (category, names.is_empty()) {
                (Some(index), _) => CategorySelection::Index(index),
                (None, false) => CategorySelection::Names(names),
                (None, true) => CategorySelection::All,
            };
            run::cmd_run(settings, selection, output, no_browser, json).await
        }
        Commands::Categories => categories::cmd_categories(&settings),
        Commands::Resolve {
            product_url,
            no_browser,
        } => resolve::cmd_resolve(settings, &product_url, no_browser).await,
        Commands::Config => config_cmd::cmd_config(&settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from(["specfetch", "-v", "run", "--category", "2", "--no-browser"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                category,
                no_browser,
                ..
            } => {
                assert_eq!(category, Some(2));
                assert!(no_browser);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_all_conflicts_with_category() {
        assert!(Cli::try_parse_from(["specfetch", "run", "--all", "--category", "1"]).is_err());
    }
}
