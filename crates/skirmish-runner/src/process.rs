//! Script process execution with live output streaming.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::RunnerError;
use crate::interpreter::Interpreter;

/// Which stream a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
  Stdout,
  Stderr,
}

/// One line of script output, in arrival order across both streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
  pub source: OutputSource,
  pub text: String,
}

impl OutputLine {
  /// The line as shown to viewers: stderr lines carry a distinct prefix.
  pub fn rendered(&self) -> String {
    match self.source {
      OutputSource::Stdout => self.text.clone(),
      OutputSource::Stderr => format!("ERROR: {}", self.text),
    }
  }
}

/// Terminal outcome of a script process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Exit code 0.
  Completed,
  /// Non-zero exit code, or termination by signal (`code: None`).
  Failed { code: Option<i32> },
}

/// Spawns scenario scripts.
pub struct ScriptRunner;

impl ScriptRunner {
  /// Spawn the interpreter for `script_path` with
  /// `[script_path, "--config", config_path]` and pipe both output streams.
  ///
  /// Fails fast with [`RunnerError::UnsupportedScriptType`] before anything
  /// is spawned, or [`RunnerError::Spawn`] when the OS refuses to start the
  /// interpreter.
  pub fn spawn(script_path: &Path, config_path: &Path) -> Result<RunningScript, RunnerError> {
    let interpreter = Interpreter::for_script(script_path)?;

    debug!(
      script = %script_path.display(),
      interpreter = interpreter.command(),
      "spawning script process"
    );

    let mut command = Command::new(interpreter.command());
    command
      .arg(script_path)
      .arg("--config")
      .arg(config_path)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| RunnerError::Spawn {
      message: e.to_string(),
    })?;

    let stdout = child.stdout.take().ok_or_else(|| RunnerError::Spawn {
      message: "stdout pipe unavailable".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| RunnerError::Spawn {
      message: "stderr pipe unavailable".to_string(),
    })?;

    let (tx, rx) = mpsc::unbounded_channel();
    forward_lines(stdout, OutputSource::Stdout, tx.clone());
    forward_lines(stderr, OutputSource::Stderr, tx);

    Ok(RunningScript { child, output: rx })
  }
}

/// A spawned script whose output is still streaming.
///
/// Drain [`next_line`](Self::next_line) until it returns `None` (both
/// pipes hit EOF), then call [`wait`](Self::wait) for the exit outcome.
/// There is no way to kill or time out the child through this handle.
#[derive(Debug)]
pub struct RunningScript {
  child: Child,
  output: mpsc::UnboundedReceiver<OutputLine>,
}

impl RunningScript {
  /// Next output line in arrival order, interleaved across stdout and
  /// stderr. `None` once the process has closed both streams.
  pub async fn next_line(&mut self) -> Option<OutputLine> {
    self.output.recv().await
  }

  /// Wait for the process to exit and map its status to an outcome.
  pub async fn wait(mut self) -> Result<RunOutcome, RunnerError> {
    let status = self.child.wait().await.map_err(|e| RunnerError::Wait {
      message: e.to_string(),
    })?;

    if status.success() {
      Ok(RunOutcome::Completed)
    } else {
      Ok(RunOutcome::Failed {
        code: status.code(),
      })
    }
  }
}

/// Forward each line of `reader` into the channel, tagged with its source.
/// The task ends at EOF or when the receiving side is dropped.
fn forward_lines<R>(reader: R, source: OutputSource, tx: mpsc::UnboundedSender<OutputLine>)
where
  R: AsyncRead + Unpin + Send + 'static,
{
  tokio::spawn(async move {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(text)) = lines.next_line().await {
      if tx.send(OutputLine { source, text }).is_err() {
        break;
      }
    }
  });
}
