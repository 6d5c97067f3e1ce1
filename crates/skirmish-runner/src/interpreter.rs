//! Interpreter dispatch by script file extension.

use std::path::Path;

use crate::error::RunnerError;

/// The interpreter used to run a script.
///
/// The mapping is an explicit, exhaustive table; anything unmatched is a
/// named fatal error rather than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
  Python,
  Node,
  Shell,
}

impl Interpreter {
  /// Resolve the interpreter for a script path from its extension.
  pub fn for_script(script_path: &Path) -> Result<Self, RunnerError> {
    let extension = script_path
      .extension()
      .and_then(|e| e.to_str())
      .unwrap_or("")
      .to_ascii_lowercase();

    match extension.as_str() {
      "py" => Ok(Self::Python),
      "js" => Ok(Self::Node),
      "sh" => Ok(Self::Shell),
      _ => Err(RunnerError::UnsupportedScriptType { extension }),
    }
  }

  /// The command invoked for this interpreter.
  pub fn command(self) -> &'static str {
    match self {
      Self::Python => "python3",
      Self::Node => "node",
      Self::Shell => "bash",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn test_known_extensions() {
    let cases = [
      ("scan.py", Interpreter::Python),
      ("scan.js", Interpreter::Node),
      ("scan.sh", Interpreter::Shell),
      ("SCAN.PY", Interpreter::Python),
    ];
    for (file, expected) in cases {
      assert_eq!(Interpreter::for_script(&PathBuf::from(file)).unwrap(), expected);
    }
  }

  #[test]
  fn test_unsupported_extension() {
    let err = Interpreter::for_script(&PathBuf::from("payload.exe")).unwrap_err();
    assert!(matches!(
      err,
      RunnerError::UnsupportedScriptType { ref extension } if extension == "exe"
    ));
  }

  #[test]
  fn test_missing_extension() {
    let err = Interpreter::for_script(&PathBuf::from("Makefile")).unwrap_err();
    assert!(matches!(err, RunnerError::UnsupportedScriptType { .. }));
  }

  #[test]
  fn test_commands() {
    assert_eq!(Interpreter::Python.command(), "python3");
    assert_eq!(Interpreter::Node.command(), "node");
    assert_eq!(Interpreter::Shell.command(), "bash");
  }
}
