use color_eyre::Result;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

const LOG_FILE_PREFIX: &str = "edusync.log";

/// Initialize the tracing subscriber.
///
/// RUST_LOG wins over the configured level. Output always goes to stderr;
/// when a log directory is configured it is also written to a daily rolling
/// file. The returned guard must be held for the life of the process so
/// buffered file output is flushed.
pub fn init_tracing(config: &LogConfig) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&config.level))
    .unwrap_or_else(|_| EnvFilter::new("info"));

  let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

  match &config.directory {
    Some(dir) => {
      std::fs::create_dir_all(dir)?;
      let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
      let (writer, guard) = tracing_appender::non_blocking(appender);

      tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()?;
      Ok(None)
    }
  }
}
