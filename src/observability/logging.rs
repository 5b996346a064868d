//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Human-readable output on stdout, JSON lines to a rotating log file
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`]
//! - The log path names the directory and file stem; the file rolls daily
//!   (`grash.log` becomes `grash.2026-10-16.log`) and only the newest
//!   [`MAX_LOG_FILES`] are kept

use std::path::Path;

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "grash=debug,tower_http=info";

/// Rotated log files kept on disk, one per day.
pub const MAX_LOG_FILES: usize = 7;

/// Error initializing logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log path {0} does not name a file")]
    InvalidPath(String),

    #[error("cannot open log file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: InitError,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber, teeing events to stdout and the rolling
/// file named by `log_path`.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let appender = rolling_appender(log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().json().with_ansi(false).with_writer(appender))
        .try_init()?;

    tracing::info!(path = %log_path.display(), "Saving logs to file");
    Ok(())
}

fn rolling_appender(log_path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let invalid = || LoggingError::InvalidPath(log_path.display().to_string());

    let stem = log_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(invalid)?;
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(stem)
        .max_log_files(MAX_LOG_FILES);
    if let Some(extension) = log_path.extension().and_then(|ext| ext.to_str()) {
        builder = builder.filename_suffix(extension);
    }

    builder.build(directory).map_err(|source| LoggingError::Open {
        path: log_path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_logs(dir: &Path) -> String {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                name.starts_with("grash.") && name.ends_with(".log")
            })
            .map(|path| std::fs::read_to_string(path).unwrap())
            .collect()
    }

    #[test]
    fn writes_json_lines_and_refuses_second_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grash.log");

        init(&path).unwrap();
        tracing::error!(task = "flush", "logging smoke test");

        let contents = read_logs(dir.path());
        let line = contents
            .lines()
            .find(|line| line.contains("logging smoke test"))
            .expect("event written to log file");
        assert!(line.starts_with('{'));
        assert!(line.contains("\"task\":\"flush\""));

        assert!(matches!(init(&path), Err(LoggingError::Init(_))));
    }

    #[test]
    fn rolled_file_keeps_stem_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        rolling_appender(&dir.path().join("grash.log")).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
        assert!(names[0].starts_with("grash."), "{names:?}");
        assert!(names[0].ends_with(".log"), "{names:?}");
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        let err = rolling_appender(Path::new("/")).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidPath(_)));
    }

    #[test]
    fn unopenable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let err = rolling_appender(&blocker.join("grash.log")).unwrap_err();
        assert!(matches!(err, LoggingError::Open { .. }));
    }
}
