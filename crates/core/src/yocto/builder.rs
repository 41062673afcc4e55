//! Stage composition for one Yocto build instance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bbgraph_config::{ConfigError, ConfigNode, Position};
use bbgraph_ninja::{Edge, GraphWriter, PHONY, escape};
use serde::Serialize;
use tracing::{debug, info};

use super::conf::{LocalConf, parse_entries, parse_external_sources};
use super::rules::{self, GENERATED_CONF, Stage};
use crate::builder::Builder;
use crate::error::CoreError;
use crate::marker::MarkerId;

const KIND: &str = "yocto";

/// Edges one instance contributes, planned but not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
  pub edges: Vec<Edge>,
  /// Outputs of the final stage.
  pub targets: Vec<PathBuf>,
}

/// One configured invocation of BitBake.
///
/// `base_dir` holds the Yocto checkout (with `poky/` in it) and `work_dir`
/// is the BitBake build directory below it. Several instances may share a
/// `base_dir` as long as their work directories differ.
#[derive(Debug, Clone)]
pub struct YoctoBuilder {
  name: String,
  base_dir: PathBuf,
  work_dir: String,
  src_stamps: Vec<PathBuf>,
  layers: Vec<String>,
  conf: LocalConf,
  additional_deps: Vec<String>,
  build_target: Option<String>,
  target_images: Option<Vec<String>>,
  position: Position,
}

impl YoctoBuilder {
  /// Read an instance from its `builder` node.
  ///
  /// Relative `external_src` paths are resolved against `root`. Mandatory
  /// fields are checked when composing, not here.
  pub fn from_config(
    name: &str,
    node: &ConfigNode<'_>,
    base_dir: &Path,
    src_stamps: Vec<PathBuf>,
    root: &Path,
  ) -> Result<Self, CoreError> {
    Self::read(name, node, base_dir, src_stamps, root).map_err(|source| CoreError::Instance {
      kind: KIND,
      instance: name.to_string(),
      source,
    })
  }

  fn read(
    name: &str,
    node: &ConfigNode<'_>,
    base_dir: &Path,
    src_stamps: Vec<PathBuf>,
    root: &Path,
  ) -> Result<Self, ConfigError> {
    let (work_dir, _) = node.get_str("work_dir", Some("build"))?;
    let layers = string_list(node, "layers")?.unwrap_or_default();
    let entries = match node.get_sequence("conf")? {
      Some(conf) => parse_entries(&conf)?,
      None => Vec::new(),
    };
    let external = match node.get_mapping("external_src")? {
      Some(mapping) => parse_external_sources(&mapping)?,
      None => Vec::new(),
    };
    let build_target = match node.get("build_target")? {
      Some(target) => Some(target.expect_str("build_target")?.to_string()),
      None => None,
    };

    Ok(Self {
      name: name.to_string(),
      base_dir: base_dir.to_path_buf(),
      work_dir,
      src_stamps,
      layers,
      conf: LocalConf::new(&entries, &external, root)?,
      additional_deps: string_list(node, "additional_deps")?.unwrap_or_default(),
      build_target,
      target_images: string_list(node, "target_images")?,
      position: node.position(),
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  fn build_dir(&self) -> PathBuf {
    self.base_dir.join(&self.work_dir)
  }

  /// Output of the environment stage.
  pub fn env_target(&self) -> PathBuf {
    self.build_dir().join("conf").join("local.conf")
  }

  /// Output of the configuration stage.
  pub fn conf_target(&self) -> PathBuf {
    self.build_dir().join("conf").join(GENERATED_CONF)
  }

  pub fn layers_marker(&self) -> MarkerId {
    MarkerId::new(&self.name, Stage::AddLayers.as_str())
  }

  /// Name of the phony edge that stands for "configuration is ready".
  pub fn conf_alias(&self) -> String {
    format!("conf-{}", self.name)
  }

  fn missing(&self, key: &str) -> CoreError {
    CoreError::Instance {
      kind: KIND,
      instance: self.name.clone(),
      source: ConfigError::MissingField {
        key: key.to_string(),
        position: self.position.clone(),
      },
    }
  }

  /// Plan every edge of the instance without touching a writer.
  ///
  /// Variable values are escaped for Ninja; `conf` is additionally quoted
  /// for the shell. Every edge is checked before any is returned.
  pub fn plan(&self) -> Result<StagePlan, CoreError> {
    let images = match &self.target_images {
      Some(images) if !images.is_empty() => images,
      _ => return Err(self.missing("target_images")),
    };
    let build_target = self.build_target.as_ref().ok_or_else(|| self.missing("build_target"))?;

    let common = BTreeMap::from([
      ("yocto_dir".to_string(), escape(&self.base_dir.to_string_lossy())),
      ("work_dir".to_string(), escape(&self.work_dir)),
    ]);
    let layers: Vec<String> = self.layers.iter().map(|layer| escape(layer)).collect();

    let env_target = self.env_target();
    let layers_marker = self.layers_marker().path();
    let conf_target = self.conf_target();
    let targets: Vec<PathBuf> = images.iter().map(|image| self.build_dir().join(image)).collect();

    let edges = vec![
      Edge::new(Stage::InitEnv.rule_name())
        .output(&env_target)
        .inputs(&self.src_stamps)
        .variables(&common),
      Edge::new(Stage::AddLayers.rule_name())
        .output(&layers_marker)
        .input(&env_target)
        .variables(&common)
        .variable("layers", layers.join(" ")),
      Edge::new(Stage::UpdateConf.rule_name())
        .output(&conf_target)
        .input(&layers_marker)
        .variables(&common)
        .variable("conf", self.conf.to_variable()?),
      Edge::new(PHONY).output(self.conf_alias()).input(&conf_target),
      Edge::new(Stage::Build.rule_name())
        .outputs(&targets)
        .inputs(self.additional_deps.iter().map(|dep| self.base_dir.join(dep)))
        .input(&conf_target)
        .variables(&common)
        .variable("target", escape(build_target))
        .variable("name", escape(&self.name)),
    ];
    for edge in &edges {
      edge.validate()?;
    }

    Ok(StagePlan { edges, targets })
  }

  /// Write the instance's edges and return the final stage outputs.
  ///
  /// Nothing is written when planning fails.
  pub fn compose(&self, writer: &mut dyn GraphWriter) -> Result<Vec<PathBuf>, CoreError> {
    rules::ensure_registered(writer)?;
    let plan = self.plan()?;

    for edge in plan.edges {
      debug!(instance = %self.name, rule = %edge.rule, outputs = ?edge.outputs, "declaring edge");
      if edge.rule == Stage::Build.rule_name() {
        writer.blank_line();
      }
      writer.declare_edge(edge)?;
    }
    writer.blank_line();

    info!(
      instance = %self.name,
      layers = self.layers.len(),
      directives = self.conf.directives().len(),
      targets = plan.targets.len(),
      "composed yocto build"
    );
    Ok(plan.targets)
  }
}

impl Builder for YoctoBuilder {
  fn name(&self) -> &str {
    &self.name
  }

  fn compose(&self, writer: &mut dyn GraphWriter) -> Result<Vec<PathBuf>, CoreError> {
    YoctoBuilder::compose(self, writer)
  }

  /// Pinning recipe revisions would need a BitBake run, which composition
  /// never does.
  fn capture_state(&self) -> Result<(), CoreError> {
    Err(CoreError::Unsupported {
      operation: "capture_state",
      builder: KIND,
    })
  }
}

/// Optional list of scalars under `key`.
fn string_list(node: &ConfigNode<'_>, key: &str) -> Result<Option<Vec<String>>, ConfigError> {
  let Some(seq) = node.get_sequence(key)? else {
    return Ok(None);
  };
  seq
    .expect_items(key)?
    .iter()
    .map(|item| item.expect_str(key).map(str::to_string))
    .collect::<Result<Vec<_>, _>>()
    .map(Some)
}
