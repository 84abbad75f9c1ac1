//! `zool412` entry point.
//!
//! # Responsibility
//! - Merge configuration with command-line overrides.
//! - Start file logging, then run one command against the lab database.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use zool412_core::{init_logging, AppConfig};

mod cli;
mod commands;

fn main() {
    if let Err(error) = run() {
        eprintln!("zool412 error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let mut config = AppConfig::load().context("failed to load configuration")?;
    apply_overrides(&mut config, &cli)?;

    let log_dir = config.logging.resolved_dir();
    let log_dir = log_dir
        .to_str()
        .with_context(|| format!("log directory is not valid UTF-8: {}", log_dir.display()))?;
    init_logging(&config.logging.level, log_dir).map_err(anyhow::Error::msg)?;

    commands::dispatch(cli.command, &config)
}

fn apply_overrides(config: &mut AppConfig, cli: &cli::Cli) -> anyhow::Result<()> {
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(absolute(dir)?);
    }
    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(path))
}
