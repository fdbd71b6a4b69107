//! Logging Setup
//!
//! Initializes tracing with an env-filter and, in debug mode, a daily-rotated
//! file appender under `.truechart/logs/`.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging configuration built by the CLI entry point
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Write log files (in addition to stderr warnings)
    pub debug_mode: bool,

    /// Directory for log files
    pub log_dir: PathBuf,
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            log_dir: default_log_dir(),
        }
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join(".truechart")
        .join("logs")
}

/// Initialize the global tracing subscriber.
///
/// Returns a worker guard that must be held for the lifetime of the process
/// when file logging is enabled; dropping it flushes pending log lines.
pub fn init_logging(config: LogConfig) -> std::io::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.debug_mode { "debug" } else { "warn" }));

    if config.debug_mode {
        std::fs::create_dir_all(&config.log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "truechart.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .init();

        tracing::info!("File logging enabled: {}", config.log_dir.display());
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        Ok(None)
    }
}

/// Remove log files older than `max_age_days`. Returns the number removed.
pub fn cleanup_old_logs(max_age_days: u64) -> std::io::Result<usize> {
    let log_dir = default_log_dir();
    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = std::time::SystemTime::now()
        .checked_sub(std::time::Duration::from_secs(max_age_days * 24 * 60 * 60));
    let Some(cutoff) = cutoff else { return Ok(0) };

    let mut removed = 0;
    for entry in std::fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map(|e| e == "log").unwrap_or(false)
            && let Ok(metadata) = entry.metadata()
            && let Ok(modified) = metadata.modified()
            && modified < cutoff
        {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
