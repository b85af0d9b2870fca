//! Log sink wiring: JSON lines to stdout and the append-only log file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::error::AppError;

/// Builds a writer that sends every line to stdout and to `log_file`,
/// opening the file for appending and creating it if needed.
///
/// # Errors
///
/// Returns `AppError::LogSink` if the file cannot be opened.
pub fn fan_out_writer(
    log_file: &Path,
) -> Result<impl for<'a> MakeWriter<'a> + Send + Sync + 'static, AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|source| AppError::LogSink {
            path: log_file.display().to_string(),
            source,
        })?;

    Ok(std::io::stdout.and(Arc::new(file)))
}

/// Installs the global tracing subscriber writing through
/// [`fan_out_writer`]. `RUST_LOG` controls the filter, defaulting to `info`.
///
/// # Errors
///
/// Returns `AppError::LogSink` if the log file cannot be opened.
pub fn init(log_file: &Path) -> Result<(), AppError> {
    let writer = fan_out_writer(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(writer)
        .init();

    Ok(())
}
