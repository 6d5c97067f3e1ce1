//! Skirmish Runner
//!
//! Runs a scenario's script as a child process and streams its console
//! output.
//!
//! - [`config`] materializes an execution's configuration snapshot into a
//!   collision-free temp file the script reads via `--config`.
//! - [`interpreter`] maps script file extensions to interpreter commands:
//!   an explicit table with a named error for everything unmatched.
//! - [`process`] spawns the interpreter and forwards each stdout/stderr
//!   line, interleaved in arrival order, then reports the exit outcome.
//!
//! There is deliberately no timeout and no kill path here: once spawned, a
//! script runs to its own completion.

mod config;
mod error;
mod interpreter;
mod process;

pub use config::{remove_config_file, write_config_file};
pub use error::RunnerError;
pub use interpreter::Interpreter;
pub use process::{OutputLine, OutputSource, RunOutcome, RunningScript, ScriptRunner};
