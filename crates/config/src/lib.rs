//! bbgraph-config: typed access to bbgraph project files
//!
//! This crate wraps a parsed YAML document and exposes:
//! - `Document`: a loaded project file with its source name
//! - `ConfigNode`: a borrowed, typed view over any node in the document
//! - `Position`: `file:line:column` locations carried by every error
//!
//! Parsing keeps source markers so configuration mistakes can be reported
//! at the exact place they were written.

mod document;
mod error;
mod node;

pub use document::Document;
pub use error::{ConfigError, Position};
pub use node::ConfigNode;

/// Result type for configuration access
pub type Result<T> = std::result::Result<T, ConfigError>;
