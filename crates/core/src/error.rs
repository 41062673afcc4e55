//! Error types for bbgraph-core

use bbgraph_config::{ConfigError, Position};
use bbgraph_ninja::NinjaError;
use thiserror::Error;

/// Errors that can occur while composing a build graph
#[derive(Debug, Error)]
pub enum CoreError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("graph error: {0}")]
  Graph(#[from] NinjaError),

  /// A configuration error inside one named build instance.
  #[error("{kind} instance '{instance}': {source}")]
  Instance {
    kind: &'static str,
    instance: String,
    #[source]
    source: ConfigError,
  },

  #[error("{position}: invalid name '{name}': {reason}")]
  InvalidName {
    name: String,
    reason: &'static str,
    position: Position,
  },

  #[error("{position}: component '{component}' uses unknown builder type '{kind}'")]
  UnknownBuilder {
    component: String,
    kind: String,
    position: Position,
  },

  #[error("{position}: component '{component}' uses unknown source type '{kind}'")]
  UnknownFetcher {
    component: String,
    kind: String,
    position: Position,
  },

  /// POSIX shells have no way to express a NUL byte inside a word.
  #[error("cannot quote {0:?} as a shell word")]
  Unquotable(String),

  #[error("rule '{0}' must be registered before composing")]
  RulesNotRegistered(String),

  #[error("{operation} is not supported by the {builder} builder")]
  Unsupported { operation: &'static str, builder: &'static str },
}
