//! Error types for bbgraph-ninja

use thiserror::Error;

/// Errors raised while declaring or validating a Ninja graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NinjaError {
  #[error("rule '{0}' is already declared")]
  DuplicateRule(String),

  #[error("edge for '{output}' uses undeclared rule '{rule}'")]
  UnknownRule { rule: String, output: String },

  #[error("edge declares no outputs (rule '{0}')")]
  NoOutputs(String),

  /// Two edges claim the same output; Ninja refuses such files.
  #[error("multiple edges produce '{0}'")]
  DuplicateOutput(String),

  #[error("dependency cycle detected involving '{0}'")]
  Cycle(String),

  /// A variable value would spill onto the next line of the file.
  #[error("edge for '{output}' binds '{variable}' to a value containing a line break")]
  LineBreak { output: String, variable: String },
}
