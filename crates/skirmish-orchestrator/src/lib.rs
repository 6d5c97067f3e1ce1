//! Skirmish Orchestrator
//!
//! The entry point for running a scenario. `launch` validates the scenario,
//! creates the execution record, and returns it immediately; everything
//! else happens in a background task per execution:
//!
//! ```text
//! launch(scenario_id, user_id, config)
//!   │  validate scenario ──────────────▶ ScenarioNotFound (synchronous)
//!   │  create execution record (running)
//!   └─▶ background task
//!         materialize config file
//!         spawn interpreter process
//!         per output line: append to store + publish to subscribers
//!         on exit: final status update + status event (always last)
//!         remove config file (best effort)
//! ```
//!
//! Any failure after the synchronous validation step is folded into the
//! execution's terminal `Failed` state with the error message in `output`
//! and published like any other completion - the caller of `launch` never
//! sees it as an error.

mod error;
mod orchestrator;

pub use error::LaunchError;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
