//! Scenario definition types and the lookup trait.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A threat scenario: a script plus the metadata needed to present and run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
  /// Stable scenario id.
  pub id: i64,

  /// Human-readable name, e.g. "Network Port Scanner".
  pub name: String,

  /// Short description shown in listings.
  #[serde(default)]
  pub description: Option<String>,

  /// Path to the executable script. The interpreter is chosen from the
  /// file extension at launch time.
  pub script_path: PathBuf,

  /// Directory the scenario bundle lives in.
  #[serde(default)]
  pub folder_path: Option<PathBuf>,

  /// Path to the scenario's default configuration file, if it ships one.
  #[serde(default)]
  pub config_path: Option<PathBuf>,

  /// When the scenario definition was last updated upstream.
  #[serde(default)]
  pub last_updated: Option<DateTime<Utc>>,
}

/// Source of scenario definitions.
///
/// Implement this trait to back the orchestrator with a catalog - an
/// in-memory map, a database table, a directory of manifests. The
/// orchestrator only ever needs `get`.
#[async_trait]
pub trait ScenarioSource: Send + Sync {
  /// Get a scenario by id. Returns `Ok(None)` if no such scenario exists.
  async fn get(&self, id: i64) -> Result<Option<Scenario>, CatalogError>;

  /// List all known scenarios, ordered by id.
  async fn list(&self) -> Result<Vec<Scenario>, CatalogError>;
}
