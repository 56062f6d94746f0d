use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initializes logging: console output on stderr, plus daily-rotated JSON
/// files when a log directory is configured.
///
/// Console logs go to stderr so JSONL written to stdout stays clean. The
/// returned guard must be held until exit to flush the file writer.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    // Respect RUST_LOG if set; otherwise use the configured default
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            // Ensure logs directory exists
            let _ = fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, "client-jsonl.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Set the global default subscriber
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
