//! Config command.

use console::style;

use crate::config::Settings;

/// Print where settings came from and their effective values.
pub fn cmd_config(settings: &Settings) -> anyhow::Result<()> {
    match &settings.source_path {
        Some(path) => println!("{} Loaded from {}", style("→").cyan(), path.display()),
        None => println!(
            "{} No config file found; using defaults",
            style("→").cyan()
        ),
    }
    println!();
    print!("{}", settings.to_toml()?);
    Ok(())
}
