//! Shared logging and home-directory helpers for metatag binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "metatag=info,metatag_db=info";
const HOME_ENV: &str = "METATAG_HOME";

/// Logging configuration for a metatag binary.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter to stderr instead of warnings only.
    pub verbose: bool,
    /// Override for the log directory; defaults to `<home>/logs`.
    pub log_dir: Option<&'a Path>,
}

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Resolve the metatag home directory.
///
/// Priority:
/// 1) METATAG_HOME
/// 2) home directory + `.metatag`
/// 3) ./.metatag
pub fn metatag_home() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV) {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".metatag"))
        .unwrap_or_else(|| PathBuf::from(".").join(".metatag"))
}

/// Logs directory: `<home>/logs`
pub fn logs_dir() -> PathBuf {
    metatag_home().join("logs")
}

/// Ensure a log directory exists and return it.
pub fn ensure_logs_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

/// Initialize tracing with a daily rolling file and stderr output.
///
/// A log directory that cannot be created only disables the file layer;
/// console logging still comes up.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let file_filter = env_filter();
    let console_filter = if config.verbose {
        env_filter()
    } else {
        EnvFilter::new("warn")
    };

    let dir = config.log_dir.map(Path::to_path_buf).unwrap_or_else(logs_dir);
    let mut guard = None;
    let file_layer = match ensure_logs_dir(&dir) {
        Ok(dir) => {
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", sanitize_name(config.app_name)));
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        Err(err) => {
            eprintln!("Warning: {:#}", err);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: guard })
}

/// `RUST_LOG` if set, otherwise the metatag defaults.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
