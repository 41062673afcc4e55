//! Configuration flattening for the Yocto builder.
//!
//! The `conf` section is a list of `[key, value]` pairs. An entry may also
//! be a group, a list of pairs spliced in where a single pair would go:
//!
//! ```yaml
//! conf:
//!   - [MACHINE, "qemux86-64"]
//!   - [[DISTRO, poky], [INIT_MANAGER, systemd]]
//! ```
//!
//! Flattening walks entries in order and yields one directive per pair.
//! Only one level of grouping is accepted; deeper nesting is rejected
//! instead of being guessed at.
//!
//! Materialized lines pass through two expanders before they reach the
//! generated file: Ninja (which eats `$`) and the shell (which splits
//! words). [`Directive::materialize`] escapes for both. Neither can carry
//! a line break inside a variable, so keys, values and source paths with
//! one are rejected where they are read.

use std::path::{Path, PathBuf};

use bbgraph_config::{ConfigError, ConfigNode, Position};
use bbgraph_ninja::escape;
use serde::Serialize;

use crate::error::CoreError;
use crate::paths::absolutize;
use crate::shell;

/// Prefix of directives that point a recipe at a local source tree.
pub const OVERRIDE_PREFIX: &str = "EXTERNALSRC_pn-";

/// One `KEY = "value"` line of the generated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
  pub key: String,
  pub value: String,
}

impl Directive {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      value: value.into(),
    }
  }

  /// The assignment as BitBake should read it.
  pub fn assignment(&self) -> String {
    format!("{} = \"{}\"", self.key, self.value)
  }

  /// The assignment quoted as one shell word, then escaped for Ninja.
  ///
  /// Ninja expands first, so the escaping wraps the quoting.
  pub fn materialize(&self) -> Result<String, CoreError> {
    shell::quote(&self.assignment()).map(|word| escape(&word))
  }

  fn from_pair(node: &ConfigNode<'_>) -> Result<Self, ConfigError> {
    let items = node.expect_items("conf")?;
    let [key, value] = items.as_slice() else {
      return Err(ConfigError::structural(
        format!("conf entry must be a [key, value] pair, found {} element(s)", items.len()),
        node.position(),
      ));
    };
    Ok(Self::new(scalar(key, "key")?, scalar(value, "value")?))
  }
}

fn scalar<'a>(node: &ConfigNode<'a>, what: &str) -> Result<&'a str, ConfigError> {
  let text = node
    .as_str()
    .ok_or_else(|| ConfigError::structural(format!("conf {what} must be a scalar"), node.position()))?;
  single_line(text, &format!("conf {what}"), node.position())?;
  Ok(text)
}

/// Reject text that cannot live on one line of the generated file.
fn single_line(text: &str, what: &str, position: Position) -> Result<(), ConfigError> {
  if text.contains(['\n', '\r', '\0']) {
    return Err(ConfigError::structural(
      format!("{what} {text:?} contains a line break or NUL byte"),
      position,
    ));
  }
  Ok(())
}

/// A declared `conf` entry: a single pair or a one-level group of pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveEntry {
  Pair(Directive),
  Group(Vec<Directive>),
}

impl DirectiveEntry {
  /// Read one entry of the `conf` sequence.
  pub fn from_node(node: &ConfigNode<'_>) -> Result<Self, ConfigError> {
    let Some(items) = node.items() else {
      return Err(ConfigError::structural("expected array on 'conf' node", node.position()));
    };
    let Some(first) = items.first() else {
      return Err(ConfigError::structural("empty conf entry", node.position()));
    };
    if !first.is_sequence() {
      return Directive::from_pair(node).map(DirectiveEntry::Pair);
    }

    let mut group = Vec::with_capacity(items.len());
    for inner in &items {
      if !inner.is_sequence() {
        return Err(ConfigError::structural(
          "conf group mixes pairs and scalars",
          inner.position(),
        ));
      }
      if inner.items().and_then(|i| i.first().map(|n| n.is_sequence())) == Some(true) {
        return Err(ConfigError::structural(
          "conf groups can only be nested one level deep",
          inner.position(),
        ));
      }
      group.push(Directive::from_pair(inner)?);
    }
    Ok(DirectiveEntry::Group(group))
  }

  pub fn directives(&self) -> &[Directive] {
    match self {
      DirectiveEntry::Pair(directive) => std::slice::from_ref(directive),
      DirectiveEntry::Group(group) => group,
    }
  }
}

/// Read the whole `conf` sequence.
pub fn parse_entries(node: &ConfigNode<'_>) -> Result<Vec<DirectiveEntry>, ConfigError> {
  node
    .expect_items("conf")?
    .iter()
    .map(DirectiveEntry::from_node)
    .collect()
}

/// Flatten entries into directives, preserving declaration order.
///
/// Duplicate keys are kept: BitBake applies its own last-wins rule.
pub fn flatten(entries: &[DirectiveEntry]) -> Vec<Directive> {
  entries.iter().flat_map(|e| e.directives().iter().cloned()).collect()
}

/// An `external_src` mapping entry: recipe name and local source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSource {
  pub recipe: String,
  /// Path segments; a single element for plain paths.
  pub segments: Vec<String>,
  pub position: Position,
}

impl ExternalSource {
  /// Joined path. An absolute segment discards everything before it.
  pub fn path(&self) -> PathBuf {
    self.segments.iter().collect()
  }

  /// Absolute source path. BitBake resolves relative paths against its own
  /// build directory, so they are anchored at `root` here.
  pub fn resolve(&self, root: &Path) -> PathBuf {
    absolutize(root, &self.path())
  }

  /// Fails when `root` itself brings a line break into the path.
  pub fn to_directive(&self, root: &Path) -> Result<Directive, ConfigError> {
    let path = self.resolve(root).to_string_lossy().into_owned();
    single_line(
      &path,
      &format!("external_src path for '{}'", self.recipe),
      self.position.clone(),
    )?;
    Ok(Directive::new(format!("{OVERRIDE_PREFIX}{}", self.recipe), path))
  }
}

/// Read the `external_src` mapping in declaration order.
pub fn parse_external_sources(node: &ConfigNode<'_>) -> Result<Vec<ExternalSource>, ConfigError> {
  node
    .expect_entries("external_src")?
    .into_iter()
    .map(|(recipe, value)| {
      single_line(recipe, "external_src recipe", value.position())?;
      let segments = match value.items() {
        Some(items) => items
          .iter()
          .map(|item| {
            let segment = item.expect_str(recipe)?;
            single_line(segment, "external_src path", item.position())?;
            Ok(segment.to_string())
          })
          .collect::<Result<Vec<_>, ConfigError>>()?,
        None => {
          let path = value.expect_str(recipe)?;
          single_line(path, "external_src path", value.position())?;
          vec![path.to_string()]
        }
      };
      if segments.is_empty() {
        return Err(ConfigError::structural(
          format!("external_src path for '{recipe}' is empty"),
          value.position(),
        ));
      }
      Ok(ExternalSource {
        recipe: recipe.to_string(),
        segments,
        position: value.position(),
      })
    })
    .collect()
}

/// The complete, ordered set of directives for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalConf {
  directives: Vec<Directive>,
}

impl LocalConf {
  /// Declared directives first, then one override per external source.
  pub fn new(
    entries: &[DirectiveEntry],
    external: &[ExternalSource],
    root: &Path,
  ) -> Result<Self, ConfigError> {
    let mut directives = flatten(entries);
    for src in external {
      directives.push(src.to_directive(root)?);
    }
    Ok(Self { directives })
  }

  pub fn directives(&self) -> &[Directive] {
    &self.directives
  }

  /// Materialized lines, one shell word each.
  pub fn lines(&self) -> Result<Vec<String>, CoreError> {
    self.directives.iter().map(Directive::materialize).collect()
  }

  /// Value for the `conf` variable of the configuration stage.
  pub fn to_variable(&self) -> Result<String, CoreError> {
    Ok(self.lines()?.join(" "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bbgraph_config::Document;
  use proptest::prelude::*;

  fn conf_entries(yaml: &str) -> Result<Vec<DirectiveEntry>, ConfigError> {
    let doc = Document::parse("conf.yaml", yaml).unwrap();
    let conf = doc.root().get_sequence("conf").unwrap().unwrap();
    parse_entries(&conf)
  }

  fn pairs(directives: &[Directive]) -> Vec<(&str, &str)> {
    directives.iter().map(|d| (d.key.as_str(), d.value.as_str())).collect()
  }

  /// What Ninja does to a variable value: `$$` becomes `$`.
  fn ninja_expand(value: &str) -> String {
    value.replace("$$", "$")
  }

  /// What the shell does to the expanded variable.
  fn split(value: &str) -> Vec<String> {
    shlex::split(value).unwrap()
  }

  fn external(recipe: &str, segments: &[&str]) -> ExternalSource {
    ExternalSource {
      recipe: recipe.to_string(),
      segments: segments.iter().map(|s| s.to_string()).collect(),
      position: Position::unknown("ext.yaml"),
    }
  }

  #[test]
  fn flattens_singletons_and_groups_in_order() {
    let entries = conf_entries(
      r#"
conf:
  - [FOO, "1"]
  - [[BAR, "2"], [BAZ, "3"]]
"#,
    )
    .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(
      pairs(&flatten(&entries)),
      vec![("FOO", "1"), ("BAR", "2"), ("BAZ", "3")]
    );
  }

  #[test]
  fn group_between_pairs_keeps_position() {
    let entries = conf_entries(
      r#"
conf:
  - [MACHINE, qemux86-64]
  - [[DISTRO, poky], [INIT_MANAGER, systemd]]
  - [DISTRO, custom]
"#,
    )
    .unwrap();

    assert_eq!(
      pairs(&flatten(&entries)),
      vec![
        ("MACHINE", "qemux86-64"),
        ("DISTRO", "poky"),
        ("INIT_MANAGER", "systemd"),
        ("DISTRO", "custom"),
      ]
    );
  }

  #[test]
  fn duplicate_keys_are_kept() {
    let entries = conf_entries("conf:\n  - [A, \"1\"]\n  - [A, \"2\"]\n").unwrap();
    assert_eq!(pairs(&flatten(&entries)), vec![("A", "1"), ("A", "2")]);
  }

  #[test]
  fn numeric_values_are_read_as_text() {
    let entries = conf_entries("conf:\n  - [BB_NUMBER_THREADS, 8]\n").unwrap();
    assert_eq!(pairs(&flatten(&entries)), vec![("BB_NUMBER_THREADS", "8")]);
  }

  #[test]
  fn scalar_entry_is_structural_error() {
    let err = conf_entries("conf:\n  - FOO\n").unwrap_err();
    assert!(matches!(err, ConfigError::Structural { ref message, .. } if message.contains("expected array")));
    assert!(err.to_string().starts_with("conf.yaml:"));
  }

  #[test]
  fn nested_group_is_rejected() {
    let err = conf_entries("conf:\n  - [[[A, \"1\"]], [B, \"2\"]]\n").unwrap_err();
    assert!(err.to_string().contains("one level deep"));
  }

  #[test]
  fn group_mixing_scalars_is_rejected() {
    let err = conf_entries("conf:\n  - [[A, \"1\"], B]\n").unwrap_err();
    assert!(err.to_string().contains("mixes pairs and scalars"));
  }

  #[test]
  fn pair_arity_is_checked() {
    assert!(conf_entries("conf:\n  - [A]\n").is_err());
    assert!(conf_entries("conf:\n  - [A, \"1\", extra]\n").is_err());
    assert!(conf_entries("conf:\n  - []\n").is_err());
  }

  #[test]
  fn mapping_value_is_rejected() {
    let err = conf_entries("conf:\n  - [A, {b: c}]\n").unwrap_err();
    assert!(err.to_string().contains("conf value must be a scalar"));
  }

  #[test]
  fn multiline_value_is_rejected_at_its_position() {
    let err = conf_entries("conf:\n  - [EXTRA, \"a\\nb\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::Structural { ref message, .. } if message.contains("conf value")));
    assert_eq!(err.position().unwrap().line, 2);
  }

  #[test]
  fn line_breaks_in_keys_and_groups_are_rejected() {
    let err = conf_entries("conf:\n  - [\"A\\rB\", \"1\"]\n").unwrap_err();
    assert!(err.to_string().contains("conf key"));
    assert!(conf_entries("conf:\n  - [[A, \"1\"], [B, \"x\\ny\"]]\n").is_err());
  }

  #[test]
  fn external_source_with_line_break_is_rejected() {
    let doc = Document::parse("ext.yaml", "external_src:\n  mylib: [srcs, \"a\\nb\"]\n").unwrap();
    let node = doc.root().get_mapping("external_src").unwrap().unwrap();
    let err = parse_external_sources(&node).unwrap_err();
    assert!(err.to_string().contains("external_src path"));
  }

  #[cfg(not(windows))]
  #[test]
  fn root_with_line_break_fails_the_override() {
    let src = external("mylib", &["srcs"]);
    let err = src.to_directive(Path::new("/work/a\nb")).unwrap_err();
    assert!(err.to_string().contains("external_src path for 'mylib'"));
  }

  #[test]
  fn external_sources_accept_paths_and_segments() {
    let doc = Document::parse(
      "ext.yaml",
      "external_src:\n  mylib: [srcs, mylib]\n  kernel: /opt/linux\n",
    )
    .unwrap();
    let node = doc.root().get_mapping("external_src").unwrap().unwrap();
    let sources = parse_external_sources(&node).unwrap();

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].recipe, "mylib");
    assert_eq!(sources[0].path(), PathBuf::from("srcs/mylib"));
    assert_eq!(sources[1].path(), PathBuf::from("/opt/linux"));
  }

  #[test]
  fn external_source_with_empty_segments_is_rejected() {
    let doc = Document::parse("ext.yaml", "external_src:\n  mylib: []\n").unwrap();
    let node = doc.root().get_mapping("external_src").unwrap().unwrap();
    assert!(parse_external_sources(&node).is_err());
  }

  #[cfg(not(windows))]
  #[test]
  fn overrides_follow_declared_entries() {
    let entries = vec![
      DirectiveEntry::Pair(Directive::new("FOO", "1")),
      DirectiveEntry::Group(vec![Directive::new("BAR", "2")]),
    ];
    let external = vec![
      external("mylib", &["srcs", "mylib"]),
      external("other", &["../other"]),
    ];

    let conf = LocalConf::new(&entries, &external, Path::new("/work/top")).unwrap();
    assert_eq!(
      pairs(conf.directives()),
      vec![
        ("FOO", "1"),
        ("BAR", "2"),
        ("EXTERNALSRC_pn-mylib", "/work/top/srcs/mylib"),
        ("EXTERNALSRC_pn-other", "/work/other"),
      ]
    );
  }

  #[test]
  fn materialize_quotes_then_escapes_dollar() {
    let directive = Directive::new("DL_DIR", "${TOPDIR}/downloads");
    let line = directive.materialize().unwrap();
    assert!(line.contains("$${TOPDIR}"));
    assert_eq!(split(&ninja_expand(&line)), vec![r#"DL_DIR = "${TOPDIR}/downloads""#]);
  }

  #[test]
  fn dollar_in_key_survives_both_expanders() {
    let directive = Directive::new("A$B", "1");
    let line = directive.materialize().unwrap();
    assert!(line.contains("A$$B"));
    assert_eq!(split(&ninja_expand(&line)), vec![r#"A$B = "1""#]);
  }

  #[test]
  fn materialized_variable_splits_back_into_assignments() {
    let conf = LocalConf::new(
      &[
        DirectiveEntry::Pair(Directive::new("A", "x y")),
        DirectiveEntry::Pair(Directive::new("B", "it's $HOME")),
      ],
      &[],
      Path::new("/"),
    )
    .unwrap();

    let words = split(&ninja_expand(&conf.to_variable().unwrap()));
    assert_eq!(words, vec![r#"A = "x y""#, r#"B = "it's $HOME""#]);
  }

  #[test]
  fn empty_conf_renders_empty_variable() {
    assert_eq!(LocalConf::default().to_variable().unwrap(), "");
  }

  fn directive_strategy() -> impl Strategy<Value = Directive> {
    ("[A-Z_$]{1,8}", "[ -~]{0,16}").prop_map(|(k, v)| Directive::new(k, v))
  }

  fn entry_strategy() -> impl Strategy<Value = DirectiveEntry> {
    prop_oneof![
      directive_strategy().prop_map(DirectiveEntry::Pair),
      prop::collection::vec(directive_strategy(), 1..4).prop_map(DirectiveEntry::Group),
    ]
  }

  proptest! {
    #[test]
    fn flattening_regroups_to_input(entries in prop::collection::vec(entry_strategy(), 0..8)) {
      let flat = flatten(&entries);
      let mut rest = flat.as_slice();
      for entry in &entries {
        let n = entry.directives().len();
        prop_assert_eq!(&rest[..n], entry.directives());
        rest = &rest[n..];
      }
      prop_assert!(rest.is_empty());
    }

    #[test]
    fn materialized_line_round_trips(directive in directive_strategy()) {
      let words = split(&ninja_expand(&directive.materialize().unwrap()));
      prop_assert_eq!(words, vec![directive.assignment()]);
    }
  }
}
