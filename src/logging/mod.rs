//! Tracing setup.
//!
//! The dashboard owns stdout for the terminal UI, so it logs to a daily
//! rolling file under the app directory. The command-line paths log to
//! stderr so stdout stays machine-readable.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

const LOG_FILE_PREFIX: &str = "social-agent.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Log to a daily rolling file in `log_dir`.
///
/// Subsequent calls are no-ops.
pub fn init_file(log_dir: &Path, default_level: &str) -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }
    std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

    let subscriber = Registry::default()
        .with(build_env_filter(default_level))
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!("logging to {}", log_dir.display());
    Ok(())
}

/// Log to stderr; used by the one-shot commands and `twclaw`.
pub fn init_stderr(default_level: &str) -> Result<(), LoggingError> {
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let subscriber = Registry::default()
        .with(build_env_filter(default_level))
        .with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
