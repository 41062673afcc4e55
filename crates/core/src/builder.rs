//! Builder seam between the project generator and concrete builders.

use std::path::{Path, PathBuf};

use bbgraph_config::{ConfigNode, Position};
use bbgraph_ninja::GraphWriter;

use crate::Result;
use crate::error::CoreError;
use crate::yocto::{self, YoctoBuilder};

/// Builder types a component may name in `builder.type`.
pub const SUPPORTED_BUILDERS: &[&str] = &["yocto"];

/// A configured builder for one component.
pub trait Builder {
  fn name(&self) -> &str;

  /// Write the builder's edges and return the artifacts it produces.
  fn compose(&self, writer: &mut dyn GraphWriter) -> Result<Vec<PathBuf>>;

  /// Record the state of a finished build so it can be reproduced.
  fn capture_state(&self) -> Result<()>;
}

/// Instantiate the builder named by `kind`.
///
/// `base_dir` is the component's build directory and `src_stamps` are the
/// stamps of its fetched sources.
pub fn create_builder(
  kind: &str,
  component: &str,
  node: &ConfigNode<'_>,
  base_dir: &Path,
  src_stamps: Vec<PathBuf>,
  root: &Path,
  position: &Position,
) -> Result<Box<dyn Builder>> {
  match kind {
    "yocto" => Ok(Box::new(YoctoBuilder::from_config(component, node, base_dir, src_stamps, root)?)),
    _ => Err(CoreError::UnknownBuilder {
      component: component.to_string(),
      kind: kind.to_string(),
      position: position.clone(),
    }),
  }
}

/// Register the rule templates of every supported builder.
pub fn register_builder_rules(writer: &mut dyn GraphWriter) -> Result<usize> {
  yocto::rules::register(writer)
}
