//! Events delivered to execution subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_store::ExecutionStatus;

/// An event published for a single execution.
///
/// Serialized with a `type` discriminator so transports can frame each
/// event as one self-describing JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// A line of script output.
  Output {
    execution_id: String,
    text: String,
    timestamp: DateTime<Utc>,
  },

  /// The execution's status changed. Always the last event published for
  /// an execution; carries the full output blob when sent as a final
  /// snapshot.
  Status {
    execution_id: String,
    status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    timestamp: DateTime<Utc>,
  },
}

impl ExecutionEvent {
  /// The execution this event belongs to.
  pub fn execution_id(&self) -> &str {
    match self {
      Self::Output { execution_id, .. } | Self::Status { execution_id, .. } => execution_id,
    }
  }
}
