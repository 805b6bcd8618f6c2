//! Shared logging utilities for Draftsmith binaries.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str =
    "draftsmith=info,draftsmith_orchestrator=info,draftsmith_catalog=info";

/// Logging configuration shared by Draftsmith binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Suppress console output below warn (events stream on stdout instead).
    pub quiet_console: bool,
}

/// Initialize tracing with a per-process log file and stderr output.
///
/// The file filter honors `RUST_LOG`; without it, workspace crates log at
/// info. The console mirrors the file filter unless `quiet_console` caps it
/// at warn so structured output on stdout stays parseable.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_path = log_file_path(config.app_name)?;
    let file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.quiet_console && !config.verbose {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    Ok(())
}

/// The Draftsmith home directory: `~/.draftsmith`, or `DRAFTSMITH_HOME`.
pub fn draftsmith_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("DRAFTSMITH_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".draftsmith")
}

/// The logs directory: `~/.draftsmith/logs`.
pub fn logs_dir() -> PathBuf {
    draftsmith_home().join("logs")
}

fn log_file_path(app_name: &str) -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    Ok(logs.join(format!("{}-{stamp}.log", sanitize_name(app_name))))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
