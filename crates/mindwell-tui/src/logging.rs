use anyhow::Result;
use mindwell_core::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MINDWELL_LOG=mindwell_core=debug`.
pub const LOG_ENV: &str = "MINDWELL_LOG";

const DEFAULT_FILTER: &str = "info";

/// Log to a daily file under the config directory. The terminal belongs to the
/// UI, so nothing is written to stdout or stderr.
///
/// The returned guard flushes pending lines when dropped; hold it for the
/// lifetime of the program.
pub fn init() -> Result<WorkerGuard> {
    let log_dir = Config::config_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_appender = tracing_appender::rolling::daily(&log_dir, "mindwell.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}
