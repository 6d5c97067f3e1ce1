//! Catalog errors.

use thiserror::Error;

/// Errors that can occur while loading or querying a scenario catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// The catalog file could not be read.
  #[error("failed to read catalog file '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// The catalog file is not valid JSON.
  #[error("failed to parse catalog file '{path}': {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  /// Two catalog entries share the same id.
  #[error("duplicate scenario id {id} in catalog")]
  DuplicateId { id: i64 },
}
