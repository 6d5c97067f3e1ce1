//! Runner errors.

use thiserror::Error;

/// Errors that can occur while preparing or running a script.
#[derive(Debug, Error)]
pub enum RunnerError {
  /// The script's file extension maps to no known interpreter. Fatal and
  /// never retried.
  #[error("unsupported script type: '{extension}'")]
  UnsupportedScriptType { extension: String },

  /// The config snapshot could not be written to disk.
  #[error("failed to write config file: {message}")]
  ConfigWrite { message: String },

  /// The interpreter process could not be started.
  #[error("failed to spawn script process: {message}")]
  Spawn { message: String },

  /// Waiting on the child process failed.
  #[error("failed to wait on script process: {message}")]
  Wait { message: String },
}
