//! Stage dependency markers.
//!
//! A marker is a stamp file that stands in for state the external builder
//! does not expose (for example "layers have been added"). Ninja only sees
//! the stamp's timestamp. Marker paths are derived from the owning instance
//! and the stage, so instances never share a marker.

use std::fmt;
use std::path::PathBuf;

use bbgraph_config::Position;

use crate::error::CoreError;

/// Directory, relative to the generation root, holding all stamps.
pub const STAMP_DIR: &str = ".stamps";

/// Identity of one synthetic stamp: `(instance, stage)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId {
  instance: String,
  stage: String,
}

impl MarkerId {
  pub fn new(instance: &str, stage: &str) -> Self {
    Self {
      instance: instance.to_string(),
      stage: stage.to_string(),
    }
  }

  /// Stamp path: `.stamps/<instance>/<stage>.stamp`.
  pub fn path(&self) -> PathBuf {
    PathBuf::from(STAMP_DIR)
      .join(&self.instance)
      .join(format!("{}.stamp", self.stage))
  }
}

impl fmt::Display for MarkerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.instance, self.stage)
  }
}

/// Check that `name` can be used as an instance name.
///
/// Names become Ninja aliases and stamp directory names, so they must be a
/// single plain path component without Ninja separators.
pub fn check_name(name: &str, position: &Position) -> Result<(), CoreError> {
  let reason = if name.is_empty() {
    Some("name is empty")
  } else if name == "." || name == ".." {
    Some("name is a relative path component")
  } else if name.contains(['/', '\\']) {
    Some("name contains a path separator")
  } else if name.contains(|c: char| c.is_whitespace() || c == ':' || c == '$') {
    Some("name contains whitespace, ':' or '$'")
  } else {
    None
  };

  match reason {
    Some(reason) => Err(CoreError::InvalidName {
      name: name.to_string(),
      reason,
      position: position.clone(),
    }),
    None => Ok(()),
  }
}
