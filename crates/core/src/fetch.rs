//! Source fetchers.
//!
//! A fetcher turns a component's `sources` list into edges that produce one
//! stamp per source. The builder's first stage depends on those stamps, so
//! nothing runs against a checkout that is not there yet.

use std::path::{Path, PathBuf};

use bbgraph_config::{ConfigError, ConfigNode};
use bbgraph_ninja::{Edge, GraphWriter, Rule, escape};
use serde::Serialize;
use tracing::debug;

use crate::Result;
use crate::error::CoreError;
use crate::marker::MarkerId;
use crate::shell;

/// Source types a component may name in `sources[].type`.
pub const SUPPORTED_FETCHERS: &[&str] = &["git"];

pub const GIT_CLONE: &str = "git_clone";

/// A git checkout inside a component's build directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSource {
  pub url: String,
  pub rev: String,
  /// Checkout directory, relative to the component's build directory.
  pub dir: String,
}

impl GitSource {
  /// Read one `type: git` entry.
  pub fn from_config(node: &ConfigNode<'_>) -> std::result::Result<Self, ConfigError> {
    let (url, url_pos) = node.mandatory_str("url")?;
    let (rev, _) = node.get_str("rev", Some("HEAD"))?;
    let dir = match node.get("dir")? {
      Some(dir) => dir.expect_str("dir")?.trim_end_matches('/').to_string(),
      None => dir_from_url(&url).to_string(),
    };
    if dir.is_empty() {
      return Err(ConfigError::structural(
        format!("cannot derive a checkout directory from '{url}'"),
        url_pos,
      ));
    }
    Ok(Self { url, rev, dir })
  }

  /// Stamp touched once the checkout is at `rev`.
  pub fn stamp(&self, component: &str) -> MarkerId {
    MarkerId::new(component, &format!("git-{}", self.dir.replace('/', "-")))
  }

  /// Edge that clones and checks out the source under `build_dir`.
  pub fn edge(&self, component: &str, build_dir: &Path) -> Result<Edge> {
    let dir = build_dir.join(&self.dir);
    Ok(
      Edge::new(GIT_CLONE)
        .output(self.stamp(component).path())
        .variable("git_url", escape(&shell::quote(&self.url)?))
        .variable("git_rev", escape(&shell::quote(&self.rev)?))
        .variable("git_dir", escape(&shell::quote(&dir.to_string_lossy())?)),
    )
  }
}

/// Last path segment of a clone URL without its `.git` suffix.
fn dir_from_url(url: &str) -> &str {
  let tail = url.trim_end_matches('/').rsplit(['/', ':']).next().unwrap_or(url);
  tail.strip_suffix(".git").unwrap_or(tail)
}

/// A configured source of any supported type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
  Git(GitSource),
}

impl Source {
  pub fn stamp(&self, component: &str) -> MarkerId {
    match self {
      Source::Git(git) => git.stamp(component),
    }
  }

  pub fn edge(&self, component: &str, build_dir: &Path) -> Result<Edge> {
    match self {
      Source::Git(git) => git.edge(component, build_dir),
    }
  }
}

/// Read a component's `sources` sequence.
pub fn parse_sources(component: &str, node: &ConfigNode<'_>) -> Result<Vec<Source>> {
  let instance_error = |source: ConfigError| CoreError::Instance {
    kind: "source",
    instance: component.to_string(),
    source,
  };

  let mut sources = Vec::new();
  for item in node.expect_items("sources").map_err(instance_error)? {
    let (kind, position) = item.mandatory_str("type").map_err(instance_error)?;
    match kind.as_str() {
      "git" => sources.push(Source::Git(GitSource::from_config(&item).map_err(instance_error)?)),
      _ => {
        return Err(CoreError::UnknownFetcher {
          component: component.to_string(),
          kind,
          position,
        });
      }
    }
  }
  Ok(sources)
}

/// Register fetcher rule templates. Already registered rules are skipped.
pub fn register_rules(writer: &mut dyn GraphWriter) -> Result<usize> {
  if writer.has_rule(GIT_CLONE) {
    return Ok(0);
  }
  writer.declare_rule(
    Rule::new(
      GIT_CLONE,
      "(test -d $git_dir/.git || git clone -q $git_url $git_dir) && git -C $git_dir checkout -q $git_rev && touch $out",
    )
    .with_description("git clone $git_url"),
  )?;
  writer.blank_line();
  debug!(rule = GIT_CLONE, "registered fetcher rule");
  Ok(1)
}

/// Write fetch edges for `sources` and return their stamps in order.
pub fn compose_sources(
  writer: &mut dyn GraphWriter,
  component: &str,
  build_dir: &Path,
  sources: &[Source],
) -> Result<Vec<PathBuf>> {
  let mut stamps = Vec::with_capacity(sources.len());
  for source in sources {
    let edge = source.edge(component, build_dir)?;
    debug!(component, stamp = %source.stamp(component), "declaring fetch edge");
    writer.declare_edge(edge)?;
    stamps.push(source.stamp(component).path());
  }
  if !stamps.is_empty() {
    writer.blank_line();
  }
  Ok(stamps)
}
