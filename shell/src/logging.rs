//! Logger setup.
//!
//! Logging is off unless asked for, so that diagnostics on standard error stay
//! one line per error.

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;
use std::path::Path;

fn config() -> Config {
    ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build()
}

/// Install the global logger.
///
/// With a `file` the log is appended there, otherwise it goes to standard error.
pub fn init(level: LevelFilter, file: Option<&Path>) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    match file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open log file {}", path.display()))?;
            WriteLogger::init(level, config(), file).context("logger already installed")?;
        }
        None => {
            TermLogger::init(level, config(), TerminalMode::Stderr, ColorChoice::Auto)
                .context("logger already installed")?;
        }
    }
    Ok(())
}
