//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The level comes from the `--log-level` flag when given, then the
//! `SKIRMISH_LOG` environment variable, then defaults to `info`. Output
//! goes to stderr so `skirmish run` can pipe script output cleanly.

use anyhow::Result;
use clap::ValueEnum;
use tracing_subscriber::fmt;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
  Error,
  Warn,
  Info,
  Debug,
  Trace,
}

impl LogLevel {
  fn as_level(self) -> tracing::Level {
    match self {
      Self::Error => tracing::Level::ERROR,
      Self::Warn => tracing::Level::WARN,
      Self::Info => tracing::Level::INFO,
      Self::Debug => tracing::Level::DEBUG,
      Self::Trace => tracing::Level::TRACE,
    }
  }
}

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
  let level = cli_level.map(LogLevel::as_level).unwrap_or_else(|| {
    std::env::var("SKIRMISH_LOG")
      .ok()
      .and_then(|s| s.trim().parse().ok())
      .unwrap_or(tracing::Level::INFO)
  });

  fmt()
    .with_max_level(level)
    .with_target(true)
    .with_writer(std::io::stderr)
    .init();

  Ok(())
}
