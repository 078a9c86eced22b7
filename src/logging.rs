//! Rotating log system
//!
//! Logs to both console and daily rotating files in the configured directory.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize console + rotating file logging.
///
/// `default_filter` applies unless `RUST_LOG` is set. The returned guard
/// flushes the file writer when dropped; hold it for the life of the program.
pub fn init_logging(log_dir: &str, default_filter: &str) -> anyhow::Result<WorkerGuard> {
    let log_path = Path::new(log_dir);
    if !log_path.exists() {
        std::fs::create_dir_all(log_path)?;
    }

    // Rotates daily: brain_viewer.log.YYYY-MM-DD
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "brain_viewer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!("Logging initialized. Log directory: {}", log_dir);
    Ok(guard)
}

/// Log a recoverable fault with context
#[macro_export]
macro_rules! log_fault {
    ($err:expr) => {
        tracing::warn!(error = %$err, "Viewer fault");
    };
    ($err:expr, $($field:tt)*) => {
        tracing::warn!(error = %$err, $($field)*, "Viewer fault");
    };
}
