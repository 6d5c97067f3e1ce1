//! Config file materialization.
//!
//! Each execution gets its own config file so concurrent runs never
//! clobber each other. The caller deletes the file once the process has
//! exited; deletion failure is logged and swallowed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

use crate::error::RunnerError;

/// Serialize a configuration snapshot to a fresh file under `dir`.
///
/// The filename combines a millisecond timestamp with a random token, so
/// two executions materializing at the same instant still get distinct
/// paths. The directory is created if it does not exist.
pub async fn write_config_file(
  dir: &Path,
  config: &serde_json::Value,
) -> Result<PathBuf, RunnerError> {
  tokio::fs::create_dir_all(dir)
    .await
    .map_err(|e| RunnerError::ConfigWrite {
      message: format!("creating '{}': {}", dir.display(), e),
    })?;

  let token = uuid::Uuid::new_v4().simple().to_string();
  let filename = format!(
    "config_{}_{}.json",
    Utc::now().timestamp_millis(),
    &token[..8]
  );
  let path = dir.join(filename);

  let content =
    serde_json::to_string_pretty(config).map_err(|e| RunnerError::ConfigWrite {
      message: format!("serializing config: {e}"),
    })?;

  tokio::fs::write(&path, content)
    .await
    .map_err(|e| RunnerError::ConfigWrite {
      message: format!("writing '{}': {}", path.display(), e),
    })?;

  Ok(path)
}

/// Best-effort removal of a materialized config file.
pub async fn remove_config_file(path: &Path) {
  if let Err(e) = tokio::fs::remove_file(path).await {
    warn!(path = %path.display(), error = %e, "failed to remove config file");
  }
}
