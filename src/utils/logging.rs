/// tracing setup
///
/// The TUI owns the terminal, so it logs to a file in the config directory.
/// One-shot subcommands log to stderr. Both honour `RUST_LOG`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::utils::app_config::AppConfig;
use crate::utils::constants::LOG_FILE_NAME;

const DEFAULT_FILTER: &str = "localplace_cli=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr, warnings only unless `RUST_LOG` says otherwise
pub fn init_cli(verbose: bool) {
    let filter = if verbose || std::env::var_os("RUST_LOG").is_some() {
        env_filter()
    } else {
        EnvFilter::new("localplace_cli=warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to `localplace-cli.log` in the config directory and return its path
pub fn init_tui() -> Result<PathBuf> {
    let path = AppConfig::config_dir()?.join(LOG_FILE_NAME);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(path)
}
