//! Skirmish Scenario Catalog
//!
//! This crate contains the serializable scenario definition types and the
//! [`ScenarioSource`] trait through which the rest of the system looks up
//! scenarios. A scenario is a named bundle of a script plus metadata about
//! where it lives; how the script bytes got onto disk (git sync, manual
//! copy) is somebody else's problem - by the time an execution is launched
//! the script is expected to exist at `script_path`.
//!
//! Catalogs can be loaded from:
//! - JSON files (via CLI with `--scenarios catalog.json`)
//! - Inserted programmatically (tests, embedding applications)

mod catalog;
mod error;
mod scenario;

pub use catalog::InMemoryScenarios;
pub use error::CatalogError;
pub use scenario::{Scenario, ScenarioSource};
