//! Error types for bbgraph-config

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A location inside a configuration source.
///
/// Lines and columns come straight from the YAML scanner. A zero line means
/// the scanner had no marker for the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
  pub source: String,
  pub line: usize,
  pub column: usize,
}

impl Position {
  pub fn new(source: impl Into<String>, line: usize, column: usize) -> Self {
    Self {
      source: source.into(),
      line,
      column,
    }
  }

  /// Position that only knows its source.
  pub fn unknown(source: impl Into<String>) -> Self {
    Self::new(source, 0, 0)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.line == 0 {
      write!(f, "{}", self.source)
    } else {
      write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
  }
}

/// Errors that can occur while loading or reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {source_name}: {message}")]
  Parse { source_name: String, message: String },

  /// The shape of a node does not match what the reader expects.
  #[error("{position}: {message}")]
  Structural { message: String, position: Position },

  #[error("{position}: missing mandatory field '{key}'")]
  MissingField { key: String, position: Position },

  #[error("{position}: expected {expected} value for '{key}'")]
  TypeMismatch {
    key: String,
    expected: &'static str,
    position: Position,
  },
}

impl ConfigError {
  pub fn structural(message: impl Into<String>, position: Position) -> Self {
    ConfigError::Structural {
      message: message.into(),
      position,
    }
  }

  /// Position the error points at, when it has one.
  pub fn position(&self) -> Option<&Position> {
    match self {
      ConfigError::Structural { position, .. }
      | ConfigError::MissingField { position, .. }
      | ConfigError::TypeMismatch { position, .. } => Some(position),
      ConfigError::Io { .. } | ConfigError::Parse { .. } => None,
    }
  }
}
