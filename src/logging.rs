use crate::config::LoggingConfig;
use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "taskdeck.log";

/// Route `tracing` output to a daily rolling file; the terminal belongs to
/// the UI.
///
/// Precedence: RUST_LOG env var > `logging.level` from config. The returned
/// guard flushes pending lines on drop and must outlive the program.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
  let dir = config.log_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Could not create log directory {}: {}", dir.display(), e))?;

  let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::registry()
    .with(filter(&config.level))
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Could not install log subscriber: {}", e))?;

  Ok(guard)
}

fn filter(level: &str) -> EnvFilter {
  let default_filter = format!("taskdeck={},reqwest=warn", level);
  EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}
