use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{AppError, config::LoggingConfig};

pub const LOG_FILE: &str = "xiaozhi.log";

#[derive(Debug)]
pub struct LoggingGuard {
    /// Flushes the file writer when dropped.
    pub file: WorkerGuard,
    /// False when another global subscriber was already in place and kept.
    pub installed: bool,
}

/// Install the global subscriber: `RUST_LOG` (or the configured filter) over a
/// daily-rolling file in `config.resolved_dir()`.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and stops the background writer. If a global subscriber already
/// exists it is left in place and nothing is written to the file.
pub fn init_tracing(config: &LoggingConfig) -> Result<LoggingGuard, AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let log_dir = config.resolved_dir();
    std::fs::create_dir_all(&log_dir).map_err(|source| AppError::Logging {
        path: log_dir.clone(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let (plain, json) = if config.json {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(non_blocking_file);
        (None, Some(layer))
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .with_writer(non_blocking_file);
        (Some(layer), None)
    };

    let installed = match tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .try_init()
    {
        Ok(()) => {
            tracing::info!(dir = %log_dir.display(), "logging initialised");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "keeping the existing tracing subscriber");
            false
        }
    };
    Ok(LoggingGuard {
        file: guard,
        installed,
    })
}
