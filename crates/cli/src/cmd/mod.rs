mod check;
mod generate;
mod info;

pub use check::cmd_check;
pub use generate::cmd_generate;
pub use info::cmd_info;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bbgraph_config::Document;
use bbgraph_core::Project;
use bbgraph_core::paths::normalize;

/// Load and validate a project file against `root`.
fn load_project(file: &Path, root: &Path) -> Result<Project> {
  let doc = Document::load(file).with_context(|| format!("Failed to load project: {}", file.display()))?;
  let project =
    Project::from_document(&doc, root).with_context(|| format!("Invalid project: {}", file.display()))?;
  Ok(project)
}

/// Generation root and file name for the graph written to `output`.
///
/// The root is the graph's directory; relative `external_src` paths and the
/// generated edges are anchored there. With `create`, a missing directory
/// is created, otherwise it is resolved lexically.
fn generation_root(output: &Path, create: bool) -> Result<(PathBuf, PathBuf)> {
  let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
  let output = normalize(&cwd.join(output));
  let name = output
    .file_name()
    .map(PathBuf::from)
    .context("Output path has no file name")?;
  let dir = output
    .parent()
    .map(Path::to_path_buf)
    .context("Output path has no parent directory")?;

  if create {
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;
  }
  let root = if dir.exists() {
    dunce::canonicalize(&dir).with_context(|| format!("Failed to resolve {}", dir.display()))?
  } else {
    dir
  };
  Ok((root, name))
}
