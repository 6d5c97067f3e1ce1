//! Skirmish Store
//!
//! This crate provides the storage trait and in-memory implementation for
//! scenario executions and run history.
//!
//! The [`ExecutionStore`] trait defines operations for:
//! - Creating execution records and merging partial updates into them
//! - Appending streamed output atomically
//! - Querying execution history by scenario or by user
//! - Tracking per-user run history rows
//!
//! An execution's status only ever moves forward: `Running` to either
//! `Completed` or `Failed`. The store enforces this and freezes `output`
//! once a terminal status is reached.

mod memory;
mod types;

pub use memory::MemoryStore;
pub use types::{
  Execution, ExecutionStatus, ExecutionUpdate, RunHistory, RunHistoryStatus,
};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// An update attempted to move a status backwards or sideways.
  #[error("invalid status transition from {from:?} to {to:?} for execution '{id}'")]
  InvalidTransition {
    id: String,
    from: ExecutionStatus,
    to: ExecutionStatus,
  },
}

/// Storage trait for executions and run history.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
  /// Create a new execution record with status `Running` and empty output.
  ///
  /// The configuration snapshot is captured by value: later mutation of the
  /// caller's config object never changes what this record reports.
  async fn create(
    &self,
    scenario_id: Option<i64>,
    user_id: Option<i64>,
    config_snapshot: serde_json::Value,
  ) -> Result<Execution, StoreError>;

  /// Get an execution by id.
  async fn get(&self, id: &str) -> Result<Execution, StoreError>;

  /// Merge the provided fields into an execution record.
  ///
  /// Unspecified fields are left untouched. A status change is only
  /// accepted while the execution is still `Running`.
  async fn update(&self, id: &str, update: ExecutionUpdate) -> Result<Execution, StoreError>;

  /// Append text to an execution's accumulated output.
  ///
  /// This is a single atomic operation so concurrent completion callbacks
  /// for *different* executions never lose writes. Appends to an execution
  /// that already reached a terminal status are dropped with a warning.
  async fn append_output(&self, id: &str, text: &str) -> Result<(), StoreError>;

  /// List executions for a scenario, most recent first.
  async fn list_by_scenario(&self, scenario_id: i64) -> Result<Vec<Execution>, StoreError>;

  /// List executions started by a user, most recent first.
  async fn list_by_user(&self, user_id: i64) -> Result<Vec<Execution>, StoreError>;

  /// Create a run history row in `Pending` state.
  async fn create_run_history(
    &self,
    user_id: i64,
    scenario_name: &str,
  ) -> Result<RunHistory, StoreError>;

  /// Finalize a run history row with a terminal status and finish time.
  async fn finish_run_history(
    &self,
    id: i64,
    status: RunHistoryStatus,
  ) -> Result<RunHistory, StoreError>;

  /// List run history rows for a user, most recent first.
  async fn list_run_history(&self, user_id: i64) -> Result<Vec<RunHistory>, StoreError>;
}
