use std::{io, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogRotation, LoggingConfig};

const LOG_FILE_PREFIX: &str = "digest";
const LOG_FILE_SUFFIX: &str = "log";

/// Keeps the non-blocking file writer flushing until the process exits.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Installs the global subscriber: stderr console output plus a rotating file in `logs_dir`.
/// Later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig, logs_dir: &Path) -> Result<()> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let appender = file_appender(config, logs_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    // stdout is reserved for command output such as `list`.
    let console = fmt::layer().with_writer(io::stderr).with_target(true);
    let file = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(console)
        .with(file)
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    let _ = FILE_GUARD.set(guard);

    tracing::debug!(
        target: "lifecycle",
        logs = %logs_dir.display(),
        rotation = ?config.rotation,
        max_files = ?config.max_files,
        "tracing initialized"
    );
    Ok(())
}

/// `RUST_LOG` wins over the configured level; an unparsable level means `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_appender(config: &LoggingConfig, logs_dir: &Path) -> Result<RollingFileAppender> {
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX);
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }
    builder
        .build(logs_dir)
        .with_context(|| format!("failed to open log file in {}", logs_dir.display()))
}

fn rotation(kind: LogRotation) -> Rotation {
    match kind {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}
