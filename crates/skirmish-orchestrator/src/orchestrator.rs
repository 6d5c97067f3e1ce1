//! Execution orchestration.

use std::path::PathBuf;
use std::sync::Arc;

use skirmish_broadcast::Broadcaster;
use skirmish_runner::{
  RunOutcome, RunnerError, RunningScript, ScriptRunner, remove_config_file, write_config_file,
};
use skirmish_scenario::ScenarioSource;
use skirmish_store::{
  Execution, ExecutionStatus, ExecutionStore, ExecutionUpdate, RunHistoryStatus,
};
use tracing::{info, instrument, warn};

use crate::error::LaunchError;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
  /// Directory where per-execution config files are materialized.
  pub config_dir: PathBuf,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      config_dir: std::env::temp_dir().join("skirmish-configs"),
    }
  }
}

/// Launches scenario executions and drives them to completion.
pub struct Orchestrator {
  config: OrchestratorConfig,
  scenarios: Arc<dyn ScenarioSource>,
  store: Arc<dyn ExecutionStore>,
  broadcaster: Broadcaster,
}

impl Orchestrator {
  pub fn new(
    config: OrchestratorConfig,
    scenarios: Arc<dyn ScenarioSource>,
    store: Arc<dyn ExecutionStore>,
    broadcaster: Broadcaster,
  ) -> Self {
    Self {
      config,
      scenarios,
      store,
      broadcaster,
    }
  }

  /// Launch an execution of a scenario.
  ///
  /// Returns the freshly created `Running` record as soon as the scenario
  /// is validated; the script runs in a background task. After this
  /// returns, failures are only ever reported through the execution's
  /// status and output.
  #[instrument(name = "execution_launch", skip(self, config))]
  pub async fn launch(
    &self,
    scenario_id: i64,
    user_id: Option<i64>,
    config: serde_json::Value,
  ) -> Result<Execution, LaunchError> {
    let scenario = self
      .scenarios
      .get(scenario_id)
      .await?
      .ok_or(LaunchError::ScenarioNotFound { scenario_id })?;

    let execution = self
      .store
      .create(Some(scenario_id), user_id, config.clone())
      .await?;
    let history = self
      .store
      .create_run_history(user_id.unwrap_or(0), &scenario.name)
      .await?;

    info!(
      execution_id = %execution.id,
      scenario = %scenario.name,
      script = %scenario.script_path.display(),
      "execution started"
    );

    tokio::spawn(drive(
      self.store.clone(),
      self.broadcaster.clone(),
      self.config.config_dir.clone(),
      execution.id.clone(),
      history.id,
      scenario.script_path,
      config,
    ));

    Ok(execution)
  }
}

/// Drive one execution from config materialization to terminal status.
async fn drive(
  store: Arc<dyn ExecutionStore>,
  broadcaster: Broadcaster,
  config_dir: PathBuf,
  execution_id: String,
  history_id: i64,
  script_path: PathBuf,
  config: serde_json::Value,
) {
  let config_path = match write_config_file(&config_dir, &config).await {
    Ok(path) => path,
    Err(e) => {
      fail(&store, &broadcaster, &execution_id, history_id, &e.to_string()).await;
      return;
    }
  };

  match run_script(&store, &broadcaster, &execution_id, &script_path, &config_path).await {
    Ok(RunOutcome::Completed) => {
      finalize(
        &store,
        &broadcaster,
        &execution_id,
        history_id,
        ExecutionStatus::Completed,
      )
      .await;
    }
    Ok(RunOutcome::Failed { code }) => {
      info!(execution_id = %execution_id, exit_code = ?code, "script exited with failure");
      finalize(
        &store,
        &broadcaster,
        &execution_id,
        history_id,
        ExecutionStatus::Failed,
      )
      .await;
    }
    Err(e) => {
      fail(&store, &broadcaster, &execution_id, history_id, &e.to_string()).await;
    }
  }

  remove_config_file(&config_path).await;
}

/// Spawn the script and stream every output line to the store and the
/// subscribers as it arrives.
async fn run_script(
  store: &Arc<dyn ExecutionStore>,
  broadcaster: &Broadcaster,
  execution_id: &str,
  script_path: &std::path::Path,
  config_path: &std::path::Path,
) -> Result<RunOutcome, RunnerError> {
  let mut running: RunningScript = ScriptRunner::spawn(script_path, config_path)?;

  while let Some(line) = running.next_line().await {
    let rendered = line.rendered();
    if let Err(e) = store
      .append_output(execution_id, &format!("{rendered}\n"))
      .await
    {
      warn!(execution_id = %execution_id, error = %e, "failed to append output");
    }
    broadcaster.publish_output(execution_id, rendered).await;
  }

  running.wait().await
}

/// Record a pre-run failure: the message becomes the tail of the output,
/// then the execution finalizes as `Failed`.
async fn fail(
  store: &Arc<dyn ExecutionStore>,
  broadcaster: &Broadcaster,
  execution_id: &str,
  history_id: i64,
  message: &str,
) {
  let rendered = format!("ERROR: {message}");
  if let Err(e) = store
    .append_output(execution_id, &format!("{rendered}\n"))
    .await
  {
    warn!(execution_id = %execution_id, error = %e, "failed to append error output");
  }
  broadcaster.publish_output(execution_id, rendered).await;

  finalize(store, broadcaster, execution_id, history_id, ExecutionStatus::Failed).await;
}

/// Apply the terminal status, publish the final status event (always the
/// last event for the execution), and close out the run history row.
///
/// Store errors here are logged and swallowed: a record that cannot be
/// updated is no reason to tear anything else down.
async fn finalize(
  store: &Arc<dyn ExecutionStore>,
  broadcaster: &Broadcaster,
  execution_id: &str,
  history_id: i64,
  status: ExecutionStatus,
) {
  let output = match store
    .update(execution_id, ExecutionUpdate::status(status))
    .await
  {
    Ok(updated) => Some(updated.output),
    Err(e) => {
      warn!(execution_id = %execution_id, error = %e, "failed to record terminal status");
      None
    }
  };

  broadcaster.publish_status(execution_id, status, output).await;

  let history_status = match status {
    ExecutionStatus::Completed => RunHistoryStatus::Success,
    _ => RunHistoryStatus::Error,
  };
  if let Err(e) = store.finish_run_history(history_id, history_status).await {
    warn!(execution_id = %execution_id, error = %e, "failed to close run history");
  }

  info!(execution_id = %execution_id, status = ?status, "execution finished");
}
