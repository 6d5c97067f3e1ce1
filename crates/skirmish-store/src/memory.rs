//! In-memory execution store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::types::{
  Execution, ExecutionStatus, ExecutionUpdate, RunHistory, RunHistoryStatus,
};
use crate::{ExecutionStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
  executions: HashMap<String, Execution>,
  /// Insertion order of execution ids, oldest first. Listing walks this in
  /// reverse to give most-recent-first ordering without relying on
  /// timestamp ties.
  execution_order: Vec<String>,
  histories: HashMap<i64, RunHistory>,
  history_order: Vec<i64>,
  next_history_id: i64,
}

/// An execution store held entirely in memory.
///
/// Every operation takes the single write or read lock for the duration of
/// the map access only - no lock is held across I/O, so in-flight
/// executions never block each other beyond the map touch itself.
#[derive(Debug)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self {
      inner: RwLock::new(Inner {
        next_history_id: 1,
        ..Inner::default()
      }),
    }
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
  async fn create(
    &self,
    scenario_id: Option<i64>,
    user_id: Option<i64>,
    config_snapshot: serde_json::Value,
  ) -> Result<Execution, StoreError> {
    let execution = Execution {
      id: uuid::Uuid::new_v4().to_string(),
      scenario_id,
      user_id,
      started_at: Utc::now(),
      status: ExecutionStatus::Running,
      output: String::new(),
      config_snapshot,
    };

    let mut inner = self.inner.write().await;
    inner.execution_order.push(execution.id.clone());
    inner
      .executions
      .insert(execution.id.clone(), execution.clone());
    Ok(execution)
  }

  async fn get(&self, id: &str) -> Result<Execution, StoreError> {
    self
      .inner
      .read()
      .await
      .executions
      .get(id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(id.to_string()))
  }

  async fn update(&self, id: &str, update: ExecutionUpdate) -> Result<Execution, StoreError> {
    let mut inner = self.inner.write().await;
    let execution = inner
      .executions
      .get_mut(id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if let Some(status) = update.status {
      if execution.status.is_terminal() && status != execution.status {
        return Err(StoreError::InvalidTransition {
          id: id.to_string(),
          from: execution.status,
          to: status,
        });
      }
      execution.status = status;
    }
    if let Some(output) = update.output {
      execution.output = output;
    }

    Ok(execution.clone())
  }

  async fn append_output(&self, id: &str, text: &str) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let execution = inner
      .executions
      .get_mut(id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if execution.status.is_terminal() {
      warn!(execution_id = %id, "dropping output append on terminal execution");
      return Ok(());
    }

    execution.output.push_str(text);
    Ok(())
  }

  async fn list_by_scenario(&self, scenario_id: i64) -> Result<Vec<Execution>, StoreError> {
    let inner = self.inner.read().await;
    Ok(
      inner
        .execution_order
        .iter()
        .rev()
        .filter_map(|id| inner.executions.get(id))
        .filter(|e| e.scenario_id == Some(scenario_id))
        .cloned()
        .collect(),
    )
  }

  async fn list_by_user(&self, user_id: i64) -> Result<Vec<Execution>, StoreError> {
    let inner = self.inner.read().await;
    Ok(
      inner
        .execution_order
        .iter()
        .rev()
        .filter_map(|id| inner.executions.get(id))
        .filter(|e| e.user_id == Some(user_id))
        .cloned()
        .collect(),
    )
  }

  async fn create_run_history(
    &self,
    user_id: i64,
    scenario_name: &str,
  ) -> Result<RunHistory, StoreError> {
    let mut inner = self.inner.write().await;
    let id = inner.next_history_id;
    inner.next_history_id += 1;

    let history = RunHistory {
      id,
      user_id,
      scenario_name: scenario_name.to_string(),
      status: RunHistoryStatus::Pending,
      started_at: Utc::now(),
      finished_at: None,
    };
    inner.history_order.push(id);
    inner.histories.insert(id, history.clone());
    Ok(history)
  }

  async fn finish_run_history(
    &self,
    id: i64,
    status: RunHistoryStatus,
  ) -> Result<RunHistory, StoreError> {
    let mut inner = self.inner.write().await;
    let history = inner
      .histories
      .get_mut(&id)
      .ok_or_else(|| StoreError::NotFound(format!("run history {id}")))?;

    history.status = status;
    history.finished_at = Some(Utc::now());
    Ok(history.clone())
  }

  async fn list_run_history(&self, user_id: i64) -> Result<Vec<RunHistory>, StoreError> {
    let inner = self.inner.read().await;
    Ok(
      inner
        .history_order
        .iter()
        .rev()
        .filter_map(|id| inner.histories.get(id))
        .filter(|h| h.user_id == user_id)
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_create_sets_initial_fields() {
    let store = MemoryStore::new();
    let execution = store
      .create(Some(7), Some(42), json!({"target": "10.0.0.1"}))
      .await
      .unwrap();

    assert_eq!(execution.status, ExecutionStatus::Running);
    assert_eq!(execution.scenario_id, Some(7));
    assert_eq!(execution.user_id, Some(42));
    assert!(execution.output.is_empty());
    assert_eq!(execution.config_snapshot["target"], "10.0.0.1");
  }

  #[tokio::test]
  async fn test_config_snapshot_is_independent_of_caller() {
    let store = MemoryStore::new();
    let mut config = json!({"target": "10.0.0.1"});
    let execution = store.create(Some(1), None, config.clone()).await.unwrap();

    // Mutating the caller's copy must not affect the stored snapshot.
    config["target"] = json!("10.9.9.9");

    let fetched = store.get(&execution.id).await.unwrap();
    assert_eq!(fetched.config_snapshot["target"], "10.0.0.1");
  }

  #[tokio::test]
  async fn test_get_unknown_id_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get("no-such-id").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
  }

  #[tokio::test]
  async fn test_update_merges_partial_fields() {
    let store = MemoryStore::new();
    let execution = store.create(Some(1), None, json!({})).await.unwrap();

    store
      .append_output(&execution.id, "line one\n")
      .await
      .unwrap();

    // A status-only update must leave output untouched.
    let updated = store
      .update(&execution.id, ExecutionUpdate::status(ExecutionStatus::Completed))
      .await
      .unwrap();
    assert_eq!(updated.status, ExecutionStatus::Completed);
    assert_eq!(updated.output, "line one\n");
  }

  #[tokio::test]
  async fn test_status_never_moves_backwards() {
    let store = MemoryStore::new();
    let execution = store.create(Some(1), None, json!({})).await.unwrap();

    store
      .update(&execution.id, ExecutionUpdate::status(ExecutionStatus::Completed))
      .await
      .unwrap();

    // Completed -> Running and Completed -> Failed are both rejected.
    for status in [ExecutionStatus::Running, ExecutionStatus::Failed] {
      let err = store
        .update(&execution.id, ExecutionUpdate::status(status))
        .await
        .unwrap_err();
      assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    // Re-asserting the terminal status is a no-op, not an error.
    let same = store
      .update(&execution.id, ExecutionUpdate::status(ExecutionStatus::Completed))
      .await
      .unwrap();
    assert_eq!(same.status, ExecutionStatus::Completed);
  }

  #[tokio::test]
  async fn test_append_output_accumulates_in_order() {
    let store = MemoryStore::new();
    let execution = store.create(Some(1), None, json!({})).await.unwrap();

    store.append_output(&execution.id, "a\n").await.unwrap();
    store.append_output(&execution.id, "b\n").await.unwrap();

    let fetched = store.get(&execution.id).await.unwrap();
    assert_eq!(fetched.output, "a\nb\n");
  }

  #[tokio::test]
  async fn test_output_frozen_after_terminal_status() {
    let store = MemoryStore::new();
    let execution = store.create(Some(1), None, json!({})).await.unwrap();

    store.append_output(&execution.id, "before\n").await.unwrap();
    store
      .update(&execution.id, ExecutionUpdate::status(ExecutionStatus::Failed))
      .await
      .unwrap();
    store.append_output(&execution.id, "after\n").await.unwrap();

    let fetched = store.get(&execution.id).await.unwrap();
    assert_eq!(fetched.output, "before\n");
  }

  #[tokio::test]
  async fn test_append_unknown_id_is_not_found() {
    let store = MemoryStore::new();
    let err = store.append_output("missing", "text").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
  }

  #[tokio::test]
  async fn test_list_by_scenario_most_recent_first() {
    let store = MemoryStore::new();
    let first = store.create(Some(1), None, json!({})).await.unwrap();
    let second = store.create(Some(1), None, json!({})).await.unwrap();
    store.create(Some(2), None, json!({})).await.unwrap();

    let listed = store.list_by_scenario(1).await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
  }

  #[tokio::test]
  async fn test_list_by_user_filters() {
    let store = MemoryStore::new();
    store.create(Some(1), Some(10), json!({})).await.unwrap();
    store.create(Some(1), Some(20), json!({})).await.unwrap();
    store.create(Some(1), None, json!({})).await.unwrap();

    let listed = store.list_by_user(10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user_id, Some(10));
  }

  #[tokio::test]
  async fn test_run_history_lifecycle() {
    let store = MemoryStore::new();
    let history = store.create_run_history(42, "port_scanner").await.unwrap();
    assert_eq!(history.status, RunHistoryStatus::Pending);
    assert!(history.finished_at.is_none());

    let finished = store
      .finish_run_history(history.id, RunHistoryStatus::Success)
      .await
      .unwrap();
    assert_eq!(finished.status, RunHistoryStatus::Success);
    assert!(finished.finished_at.is_some());

    let listed = store.list_run_history(42).await.unwrap();
    assert_eq!(listed.len(), 1);
  }
}
