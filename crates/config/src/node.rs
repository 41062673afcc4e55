//! Typed, position-aware accessors over YAML nodes

use marked_yaml::Node;

use crate::error::{ConfigError, Position};

/// Plain scalars that YAML treats as "no value".
const NULL_SCALARS: [&str; 3] = ["~", "null", ""];

/// A borrowed view of one node in a [`crate::Document`].
///
/// Accessors either return the typed value or an error that carries the
/// position of the offending node. Keyed accessors (`get_*`, `mandatory_*`)
/// require `self` to be a mapping.
#[derive(Debug, Clone, Copy)]
pub struct ConfigNode<'a> {
  source: &'a str,
  node: &'a Node,
}

impl<'a> ConfigNode<'a> {
  pub(crate) fn new(source: &'a str, node: &'a Node) -> Self {
    Self { source, node }
  }

  fn wrap(&self, node: &'a Node) -> Self {
    Self::new(self.source, node)
  }

  /// Start position of this node.
  pub fn position(&self) -> Position {
    match self.node.span().start() {
      Some(marker) => Position::new(self.source, marker.line(), marker.column()),
      None => Position::unknown(self.source),
    }
  }

  pub fn is_sequence(&self) -> bool {
    matches!(self.node, Node::Sequence(_))
  }

  pub fn is_mapping(&self) -> bool {
    matches!(self.node, Node::Mapping(_))
  }

  fn is_null(&self) -> bool {
    match self.node {
      Node::Scalar(s) => NULL_SCALARS.contains(&s.as_str()),
      _ => false,
    }
  }

  /// Scalar text, if this node is a scalar.
  pub fn as_str(&self) -> Option<&'a str> {
    match self.node {
      Node::Scalar(s) => Some(s.as_str()),
      _ => None,
    }
  }

  /// Scalar text, or a type mismatch reported against `what`.
  pub fn expect_str(&self, what: &str) -> Result<&'a str, ConfigError> {
    self.as_str().ok_or_else(|| self.mismatch(what, "string"))
  }

  /// Children of a sequence node, in declaration order.
  pub fn items(&self) -> Option<Vec<ConfigNode<'a>>> {
    match self.node {
      Node::Sequence(seq) => Some(seq.iter().map(|n| self.wrap(n)).collect()),
      _ => None,
    }
  }

  pub fn expect_items(&self, what: &str) -> Result<Vec<ConfigNode<'a>>, ConfigError> {
    self.items().ok_or_else(|| self.mismatch(what, "sequence"))
  }

  /// Key/value pairs of a mapping node, in declaration order.
  pub fn entries(&self) -> Option<Vec<(&'a str, ConfigNode<'a>)>> {
    match self.node {
      Node::Mapping(map) => Some(map.iter().map(|(k, v)| (k.as_str(), self.wrap(v))).collect()),
      _ => None,
    }
  }

  pub fn expect_entries(&self, what: &str) -> Result<Vec<(&'a str, ConfigNode<'a>)>, ConfigError> {
    self.entries().ok_or_else(|| self.mismatch(what, "mapping"))
  }

  /// Look up `key` in this mapping.
  pub fn get(&self, key: &str) -> Result<Option<ConfigNode<'a>>, ConfigError> {
    match self.node {
      Node::Mapping(map) => Ok(map.get_node(key).map(|n| self.wrap(n))),
      _ => Err(ConfigError::structural(
        format!("expected a mapping while looking up '{key}'"),
        self.position(),
      )),
    }
  }

  /// String value of `key`, falling back to `default` when absent.
  ///
  /// The returned position points at the value, or at this mapping when the
  /// default was used.
  pub fn get_str(&self, key: &str, default: Option<&str>) -> Result<(String, Position), ConfigError> {
    match (self.get(key)?, default) {
      (Some(node), _) => Ok((node.expect_str(key)?.to_string(), node.position())),
      (None, Some(default)) => Ok((default.to_string(), self.position())),
      (None, None) => Err(self.missing(key)),
    }
  }

  /// Sequence under `key`. An absent or null value yields `None`.
  pub fn get_sequence(&self, key: &str) -> Result<Option<ConfigNode<'a>>, ConfigError> {
    match self.get(key)? {
      Some(node) if node.is_null() => Ok(None),
      Some(node) if node.is_sequence() => Ok(Some(node)),
      Some(node) => Err(node.mismatch(key, "sequence")),
      None => Ok(None),
    }
  }

  /// Mapping under `key`. An absent or null value yields `None`.
  pub fn get_mapping(&self, key: &str) -> Result<Option<ConfigNode<'a>>, ConfigError> {
    match self.get(key)? {
      Some(node) if node.is_null() => Ok(None),
      Some(node) if node.is_mapping() => Ok(Some(node)),
      Some(node) => Err(node.mismatch(key, "mapping")),
      None => Ok(None),
    }
  }

  /// Boolean value of `key` (`true`/`false`, `yes`/`no`).
  pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(node) = self.get(key)? else {
      return Ok(default);
    };
    match node.expect_str(key)? {
      "true" | "True" | "TRUE" | "yes" | "Yes" | "on" => Ok(true),
      "false" | "False" | "FALSE" | "no" | "No" | "off" => Ok(false),
      _ => Err(node.mismatch(key, "boolean")),
    }
  }

  pub fn mandatory_sequence(&self, key: &str) -> Result<ConfigNode<'a>, ConfigError> {
    self.get_sequence(key)?.ok_or_else(|| self.missing(key))
  }

  pub fn mandatory_str(&self, key: &str) -> Result<(String, Position), ConfigError> {
    self.get_str(key, None)
  }

  fn missing(&self, key: &str) -> ConfigError {
    ConfigError::MissingField {
      key: key.to_string(),
      position: self.position(),
    }
  }

  fn mismatch(&self, key: &str, expected: &'static str) -> ConfigError {
    ConfigError::TypeMismatch {
      key: key.to_string(),
      expected,
      position: self.position(),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::{ConfigError, Document};

  const SAMPLE: &str = r#"
desc: sample
builder:
  type: yocto
  layers:
    - meta-a
    - meta-b
  empty:
  flag: yes
  nested:
    key: value
"#;

  fn sample() -> Document {
    Document::parse("sample.yaml", SAMPLE).unwrap()
  }

  #[test]
  fn get_str_reads_scalar_with_position() {
    let doc = sample();
    let (desc, pos) = doc.root().get_str("desc", None).unwrap();
    assert_eq!(desc, "sample");
    assert_eq!(pos.source, "sample.yaml");
    assert!(pos.line > 0);
  }

  #[test]
  fn get_str_uses_default_when_absent() {
    let doc = sample();
    let builder = doc.root().get_mapping("builder").unwrap().unwrap();
    let (work_dir, _) = builder.get_str("work_dir", Some("build")).unwrap();
    assert_eq!(work_dir, "build");
  }

  #[test]
  fn get_str_without_default_is_missing_field() {
    let doc = sample();
    let err = doc.root().get_str("nope", None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { ref key, .. } if key == "nope"));
  }

  #[test]
  fn get_str_on_sequence_is_type_mismatch() {
    let doc = sample();
    let builder = doc.root().get_mapping("builder").unwrap().unwrap();
    let err = builder.get_str("layers", None).unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { expected: "string", .. }));
  }

  #[test]
  fn get_sequence_preserves_order() {
    let doc = sample();
    let builder = doc.root().get_mapping("builder").unwrap().unwrap();
    let layers = builder.get_sequence("layers").unwrap().unwrap();
    let names: Vec<_> = layers.items().unwrap().iter().filter_map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["meta-a", "meta-b"]);
  }

  #[test]
  fn null_value_reads_as_absent_collection() {
    let doc = sample();
    let builder = doc.root().get_mapping("builder").unwrap().unwrap();
    assert!(builder.get_sequence("empty").unwrap().is_none());
    assert!(builder.get_mapping("empty").unwrap().is_none());
  }

  #[test]
  fn mandatory_sequence_reports_missing_key() {
    let doc = sample();
    let builder = doc.root().get_mapping("builder").unwrap().unwrap();
    let err = builder.mandatory_sequence("target_images").unwrap_err();
    assert!(err.to_string().contains("missing mandatory field 'target_images'"));
  }

  #[test]
  fn get_mapping_on_scalar_is_type_mismatch() {
    let doc = sample();
    let err = doc.root().get_mapping("desc").unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { expected: "mapping", .. }));
  }

  #[test]
  fn keyed_lookup_on_scalar_is_structural_error() {
    let doc = sample();
    let desc = doc.root().get("desc").unwrap().unwrap();
    let err = desc.get("anything").unwrap_err();
    assert!(matches!(err, ConfigError::Structural { .. }));
  }

  #[test]
  fn get_bool_parses_yaml_booleans() {
    let doc = sample();
    let builder = doc.root().get_mapping("builder").unwrap().unwrap();
    assert!(builder.get_bool("flag", false).unwrap());
    assert!(!builder.get_bool("absent", false).unwrap());
    assert!(builder.get_bool("type", false).is_err());
  }

  #[test]
  fn entries_keep_declaration_order() {
    let doc = sample();
    let keys: Vec<_> = doc.root().entries().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["desc", "builder"]);
  }
}
