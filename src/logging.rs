use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unable to determine user cache directory")]
    NoCacheDir,
    #[error("failed to prepare log file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Get the log directory path in the user-specific OS cache directory
/// - Linux: ~/.cache/dana-language-server/
/// - macOS: ~/Library/Caches/dana-language-server/
/// - Windows: %LOCALAPPDATA%\dana-language-server\
fn get_log_dir() -> Result<PathBuf, LoggingError> {
    let cache_dir = dirs::cache_dir().ok_or(LoggingError::NoCacheDir)?;

    let mut log_dir = cache_dir;
    log_dir.push("dana-language-server");

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    Ok(log_dir)
}

/// Remove session logs older than `retention`.
fn cleanup_old_logs(log_dir: &Path, retention: Duration) {
    let now = std::time::SystemTime::now();

    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    if let Some(name) = entry.file_name().to_str() {
                        if name.starts_with("session-") && name.ends_with(".log") {
                            if let Ok(modified) = metadata.modified() {
                                if let Ok(age) = now.duration_since(modified) {
                                    if age > retention {
                                        if let Err(e) = fs::remove_file(entry.path()) {
                                            eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e);
                                        } else {
                                            eprintln!("Removed old log file: {:?}", entry.path());
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Initialize logging to stderr and, optionally, a session file.
/// Returns a WorkerGuard that must be kept alive for the duration of the
/// program so buffered file output is flushed on exit.
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "info")
/// * `enable_file_logging` - Enable file logging to the cache directory (disable for tests)
///
/// # Logging Behavior
/// - **Stderr/Console**: Logs at the configured level (default "info")
/// - **Session File**: Logs at DEBUG level - includes detailed diagnostics with full parameters
pub fn init_logger(
    no_color: bool,
    log_level: Option<&str>,
    enable_file_logging: bool,
) -> Result<WorkerGuard, LoggingError> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    // Configure the stderr log level based on whether --log-level was provided
    let stderr_filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => {
            // Fall back to RUST_LOG, or "info" when unset
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    // File logs at DEBUG level by default
    let file_filter = tracing_subscriber::EnvFilter::new("debug");

    if enable_file_logging {
        let log_dir = get_log_dir()?;
        cleanup_old_logs(
            &log_dir,
            Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60),
        );

        let timestamp = time::OffsetDateTime::now_utc()
            .format(format_description!("[year][month][day]-[hour][minute][second]"))
            .expect("session timestamp formats");
        let log_filename = format!("session-{}-{}.log", timestamp, std::process::id());
        let log_path = log_dir.join(&log_filename);

        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_timer(timer)
            .with_ansi(false) // No ANSI colors in file
            .with_filter(file_filter);

        // Each layer carries its own filter, so no global filter is needed
        let result = tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init();

        match result {
            Ok(()) => {
                eprintln!("Logging to file: {:?}", log_path);
                Ok(guard)
            }
            Err(e) => {
                // Ignore errors due to the subscriber or logger already being set
                if e.to_string().contains("already been set") || e.to_string().contains("SetLoggerError") {
                    eprintln!("Logging to file: {:?}", log_path);
                    Ok(guard)
                } else {
                    Err(LoggingError::Init(e.to_string()))
                }
            }
        }
    } else {
        // No file logging - hand back a guard for a sink writer
        let (_, guard) = tracing_appender::non_blocking(std::io::sink());

        let result = tracing_subscriber::registry().with(stderr_layer).try_init();

        match result {
            Ok(()) => Ok(guard),
            Err(e) => {
                // Ignore errors due to the subscriber or logger already being set
                if e.to_string().contains("already been set") || e.to_string().contains("SetLoggerError") {
                    Ok(guard)
                } else {
                    Err(LoggingError::Init(e.to_string()))
                }
            }
        }
    }
}
