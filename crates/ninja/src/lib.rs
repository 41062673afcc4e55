//! bbgraph-ninja: emit and validate Ninja build graphs
//!
//! - [`GraphWriter`]: the seam generators write rules and edges through
//! - [`NinjaWriter`]: in-memory writer that renders `build.ninja` text
//! - [`BuildGraph`]: dependency graph over declared edges, used to reject
//!   duplicate outputs and cycles before anything is rendered
//! - [`escape`] / [`escape_path`]: Ninja lexical escaping

mod error;
mod graph;
mod syntax;
mod types;
mod writer;

pub use error::NinjaError;
pub use graph::BuildGraph;
pub use syntax::{escape, escape_path};
pub use types::{Edge, Rule};
pub use writer::{GraphWriter, NinjaWriter, PHONY};
