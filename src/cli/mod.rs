//! Command-line interface.

mod commands;
mod progress;

pub use commands::{is_verbose, log_file_path, run, Cli};
