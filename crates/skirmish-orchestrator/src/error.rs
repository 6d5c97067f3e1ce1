//! Launch errors.
//!
//! Only pre-flight conditions surface here; anything discovered after the
//! execution record exists is reported through the record's terminal
//! status instead.

use skirmish_scenario::CatalogError;
use skirmish_store::StoreError;
use thiserror::Error;

/// Errors returned synchronously from `launch`.
#[derive(Debug, Error)]
pub enum LaunchError {
  /// No scenario with the requested id exists.
  #[error("scenario {scenario_id} not found")]
  ScenarioNotFound { scenario_id: i64 },

  /// The scenario catalog could not be queried.
  #[error("scenario lookup failed: {source}")]
  Catalog {
    #[from]
    source: CatalogError,
  },

  /// The execution record could not be created.
  #[error("failed to create execution record: {source}")]
  Store {
    #[from]
    source: StoreError,
  },
}
