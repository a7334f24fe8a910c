use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Gets the absolute path to the workspace root directory
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent() // crates/
        .and_then(Path::parent) // workspace root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory test logs are written to.
fn test_log_dir() -> PathBuf {
    workspace_root().join("target/test-logs")
}

/// Installs a subscriber for tests: pretty file output plus stderr.
///
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_tracing_tests(level: Level) -> WorkerGuard {
    let env_filter = format!("{level},hyper_util=error,reqwest=warn,httpmock=warn");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&env_filter));

    let log_dir = test_log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::hourly(&log_dir, "xiaozhi.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_subscriber = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking_file)
        .pretty()
        .with_ansi(false);

    // stderr so failing tests print their diagnostics
    let console_subscriber = fmt::layer()
        .with_target(true)
        .with_level(true)
        .without_time()
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_test_writer();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_subscriber)
        .with(console_subscriber)
        .try_init();

    file_guard
}
