//! In-memory scenario catalog.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CatalogError;
use crate::scenario::{Scenario, ScenarioSource};

/// A scenario catalog held entirely in memory.
///
/// Suitable for the CLI (loaded once from a JSON file at startup) and for
/// tests. Insertion after construction is supported so embedding
/// applications can sync scenarios from an external source at runtime.
#[derive(Debug, Default)]
pub struct InMemoryScenarios {
  scenarios: RwLock<HashMap<i64, Scenario>>,
}

impl InMemoryScenarios {
  /// Create an empty catalog.
  pub fn new() -> Self {
    Self::default()
  }

  /// Load a catalog from a JSON file containing an array of scenarios.
  pub async fn from_file(path: &Path) -> Result<Self, CatalogError> {
    let content = tokio::fs::read_to_string(path)
      .await
      .map_err(|e| CatalogError::Read {
        path: path.display().to_string(),
        source: e,
      })?;

    let entries: Vec<Scenario> =
      serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
        path: path.display().to_string(),
        source: e,
      })?;

    let catalog = Self::new();
    for scenario in entries {
      catalog.insert(scenario).await?;
    }
    Ok(catalog)
  }

  /// Insert a scenario. Fails if the id is already taken.
  pub async fn insert(&self, scenario: Scenario) -> Result<(), CatalogError> {
    let mut scenarios = self.scenarios.write().await;
    if scenarios.contains_key(&scenario.id) {
      return Err(CatalogError::DuplicateId { id: scenario.id });
    }
    scenarios.insert(scenario.id, scenario);
    Ok(())
  }

  /// Remove a scenario by id. Returns whether an entry was removed.
  ///
  /// Executions already launched against the scenario keep running; only
  /// future lookups are affected.
  pub async fn remove(&self, id: i64) -> bool {
    self.scenarios.write().await.remove(&id).is_some()
  }
}

#[async_trait]
impl ScenarioSource for InMemoryScenarios {
  async fn get(&self, id: i64) -> Result<Option<Scenario>, CatalogError> {
    Ok(self.scenarios.read().await.get(&id).cloned())
  }

  async fn list(&self) -> Result<Vec<Scenario>, CatalogError> {
    let mut all: Vec<Scenario> = self.scenarios.read().await.values().cloned().collect();
    all.sort_by_key(|s| s.id);
    Ok(all)
  }
}
