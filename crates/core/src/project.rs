//! Whole-project generation.
//!
//! A project file names a set of components. Each component has sources to
//! fetch and a builder that turns them into artifacts:
//!
//! ```yaml
//! desc: "Xen-based product"
//! components:
//!   dom0:
//!     build-dir: yocto
//!     default: true
//!     sources:
//!       - type: git
//!         url: https://git.yoctoproject.org/poky
//!         rev: kirkstone
//!     builder:
//!       type: yocto
//!       build_target: core-image-minimal
//!       target_images:
//!         - tmp/deploy/images/qemux86-64/core-image-minimal-qemux86-64.wic
//! ```

use std::path::{Path, PathBuf};

use bbgraph_config::{ConfigError, ConfigNode, Document};
use bbgraph_ninja::{Edge, GraphWriter, NinjaWriter, PHONY, Rule};
use serde::Serialize;
use tracing::{debug, info};

use crate::Result;
use crate::builder::{Builder, create_builder, register_builder_rules};
use crate::error::CoreError;
use crate::fetch::{self, Source};
use crate::marker::check_name;

/// Rule that rewrites `build.ninja` when the project file changes.
pub const REGENERATE: &str = "regenerate";

/// Minimum Ninja version the generated file relies on.
pub const NINJA_REQUIRED_VERSION: &str = "1.5";

/// How the generated file regenerates itself.
#[derive(Debug, Clone)]
pub struct Regenerate {
  /// Command line run by Ninja; `$in` is the project file, `$out` the graph.
  pub command: String,
  pub project_file: PathBuf,
  pub output: PathBuf,
}

/// Outputs of one component, as seen by the rest of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentOutputs {
  pub name: String,
  /// Phony target standing for every output.
  pub alias: String,
  pub outputs: Vec<String>,
}

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generated {
  pub components: Vec<ComponentOutputs>,
  pub default_targets: Vec<String>,
  pub edges: usize,
  /// Length of the longest dependency chain, counted in parallel waves.
  pub waves: usize,
}

struct Component {
  name: String,
  build_dir: PathBuf,
  default: bool,
  sources: Vec<Source>,
  builder: Box<dyn Builder>,
}

/// A parsed project, ready to generate.
pub struct Project {
  desc: String,
  components: Vec<Component>,
}

impl Project {
  /// Read a project from its document. `root` is the generation root.
  pub fn from_document(doc: &Document, root: &Path) -> Result<Self> {
    let top = doc.root();
    let (desc, _) = top.mandatory_str("desc")?;
    let components_node = top
      .get_mapping("components")?
      .ok_or_else(|| ConfigError::MissingField {
        key: "components".to_string(),
        position: top.position(),
      })?;

    let mut components = Vec::new();
    for (name, node) in components_node.expect_entries("components")? {
      check_name(name, &node.position())?;
      components.push(read_component(name, &node, root)?);
    }
    debug!(components = components.len(), "loaded project");

    Ok(Self { desc, components })
  }

  pub fn desc(&self) -> &str {
    &self.desc
  }

  pub fn component_names(&self) -> impl Iterator<Item = &str> {
    self.components.iter().map(|c| c.name.as_str())
  }

  /// Write the complete graph for every component.
  ///
  /// The writer is validated before returning, so a successful result
  /// always renders to a file Ninja accepts.
  pub fn generate(&self, writer: &mut NinjaWriter, regenerate: Option<&Regenerate>) -> Result<Generated> {
    writer.comment("Code generated by bbgraph. All manual changes will be lost.");
    writer.comment(&self.desc);
    writer.variable("ninja_required_version", NINJA_REQUIRED_VERSION);
    writer.blank_line();

    if let Some(regen) = regenerate {
      writer.declare_rule(
        Rule::new(REGENERATE, &regen.command)
          .with_description("Regenerating $out")
          .as_generator(),
      )?;
      writer.blank_line();
    }
    fetch::register_rules(writer)?;
    register_builder_rules(writer)?;

    let mut summary = Vec::with_capacity(self.components.len());
    for component in &self.components {
      fetch::compose_sources(writer, &component.name, &component.build_dir, &component.sources)?;
      let outputs = component.builder.compose(writer)?;
      writer.declare_edge(Edge::new(PHONY).output(&component.name).inputs(&outputs))?;
      writer.blank_line();

      summary.push(ComponentOutputs {
        name: component.name.clone(),
        alias: component.name.clone(),
        outputs: outputs.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
      });
    }

    let marked: Vec<String> = self
      .components
      .iter()
      .filter(|c| c.default)
      .map(|c| c.name.clone())
      .collect();
    let default_targets = if marked.is_empty() {
      self.components.iter().map(|c| c.name.clone()).collect()
    } else {
      marked
    };
    writer.default_targets(&default_targets);

    if let Some(regen) = regenerate {
      writer.blank_line();
      writer.declare_edge(Edge::new(REGENERATE).output(&regen.output).input(&regen.project_file))?;
    }

    let graph = writer.graph()?;
    let waves = graph.waves().len();
    info!(
      components = summary.len(),
      edges = graph.len(),
      waves,
      defaults = ?default_targets,
      "generated build graph"
    );

    Ok(Generated {
      components: summary,
      default_targets,
      edges: graph.len(),
      waves,
    })
  }
}

fn read_component(name: &str, node: &ConfigNode<'_>, root: &Path) -> Result<Component> {
  let wrap = |source: ConfigError| CoreError::Instance {
    kind: "component",
    instance: name.to_string(),
    source,
  };

  let (build_dir, _) = node.get_str("build-dir", Some(name)).map_err(wrap)?;
  let build_dir = PathBuf::from(build_dir);
  let default = node.get_bool("default", false).map_err(wrap)?;
  let sources = match node.get_sequence("sources").map_err(wrap)? {
    Some(seq) => fetch::parse_sources(name, &seq)?,
    None => Vec::new(),
  };
  let src_stamps = sources.iter().map(|s| s.stamp(name).path()).collect();

  let builder_node = node
    .get_mapping("builder")
    .map_err(wrap)?
    .ok_or_else(|| {
      wrap(ConfigError::MissingField {
        key: "builder".to_string(),
        position: node.position(),
      })
    })?;
  let (kind, position) = builder_node.mandatory_str("type").map_err(wrap)?;
  let builder = create_builder(&kind, name, &builder_node, &build_dir, src_stamps, root, &position)?;

  Ok(Component {
    name: name.to_string(),
    build_dir,
    default,
    sources,
    builder,
  })
}
