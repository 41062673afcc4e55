//! Loading project files into position-aware documents

use std::fs;
use std::path::Path;

use marked_yaml::Node;
use tracing::debug;

use crate::error::ConfigError;
use crate::node::ConfigNode;

/// A parsed configuration document.
///
/// The document owns the YAML tree. Views into it are handed out as
/// [`ConfigNode`]s that borrow from the document.
#[derive(Debug)]
pub struct Document {
  source: String,
  root: Node,
}

impl Document {
  /// Parse YAML text. `source` names the text in error messages.
  pub fn parse(source: impl Into<String>, text: &str) -> Result<Self, ConfigError> {
    let source = source.into();
    let root = marked_yaml::parse_yaml(0, text).map_err(|e| ConfigError::Parse {
      source_name: source.clone(),
      message: e.to_string(),
    })?;
    debug!(source = %source, "parsed configuration document");
    Ok(Self { source, root })
  }

  /// Read and parse a YAML file from disk.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.display().to_string(),
      source,
    })?;
    Self::parse(path.display().to_string(), &text)
  }

  /// Name used for this document in positions.
  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn root(&self) -> ConfigNode<'_> {
    ConfigNode::new(&self.source, &self.root)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn parse_exposes_root_mapping() {
    let doc = Document::parse("inline.yaml", "desc: test\n").unwrap();
    assert_eq!(doc.source(), "inline.yaml");
    assert!(doc.root().is_mapping());
  }

  #[test]
  fn parse_error_names_source() {
    let err = Document::parse("broken.yaml", "desc: [unterminated\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.yaml"));
  }

  #[test]
  fn load_reads_file_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "desc: from disk").unwrap();

    let doc = Document::load(file.path()).unwrap();
    let (desc, _) = doc.root().get_str("desc", None).unwrap();
    assert_eq!(desc, "from disk");
  }

  #[test]
  fn load_missing_file_is_io_error() {
    let err = Document::load(Path::new("/nonexistent/bbgraph/build.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
  }
}
