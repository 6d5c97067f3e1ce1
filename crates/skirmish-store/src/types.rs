use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a scenario execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Running,
  Completed,
  Failed,
}

impl ExecutionStatus {
  /// Whether this status permits no further transitions.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Failed)
  }
}

/// One timed run of a scenario's script with a specific config snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
  /// Unique execution id, assigned at creation.
  pub id: String,

  /// The scenario this execution ran. `None` once the scenario definition
  /// has been removed from the catalog.
  pub scenario_id: Option<i64>,

  /// The initiating user. `None` for anonymous runs.
  pub user_id: Option<i64>,

  /// When the execution was created.
  pub started_at: DateTime<Utc>,

  pub status: ExecutionStatus,

  /// Everything the script emitted on stdout and stderr, concatenated in
  /// arrival order. Frozen once `status` is terminal.
  pub output: String,

  /// The exact configuration used for this run, captured at creation.
  pub config_snapshot: serde_json::Value,
}

/// A partial update to an execution record.
///
/// Only fields set to `Some` are merged; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ExecutionUpdate {
  pub status: Option<ExecutionStatus>,
  pub output: Option<String>,
}

impl ExecutionUpdate {
  /// An update that only changes the status.
  pub fn status(status: ExecutionStatus) -> Self {
    Self {
      status: Some(status),
      output: None,
    }
  }
}

/// Status of a run history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunHistoryStatus {
  Pending,
  Success,
  Error,
}

/// Per-user audit row created alongside each execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
  pub id: i64,

  /// The initiating user; 0 for anonymous runs.
  pub user_id: i64,

  /// Scenario name at launch time, kept verbatim so history survives
  /// catalog edits.
  pub scenario_name: String,

  pub status: RunHistoryStatus,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
}
