//! Implementation of the `bbgraph generate` command.
//!
//! Loads the project, generates the graph in memory and writes it to the
//! output path in one step. The file is replaced atomically, so a failed run
//! leaves any previous `build.ninja` untouched.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use bbgraph_core::Regenerate;
use bbgraph_core::shell;
use bbgraph_ninja::{NinjaWriter, escape};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{generation_root, load_project};
use crate::output::{plural, print_stat, print_success, print_warning};

pub fn cmd_generate(file: &Path, output: &Path) -> Result<()> {
  let (root, output_name) = generation_root(output, true)?;

  let project_file =
    dunce::canonicalize(file).with_context(|| format!("Project file not found: {}", file.display()))?;
  let project = load_project(&project_file, &root)?;

  let regenerate = Regenerate {
    command: regenerate_command()?,
    project_file,
    output: output_name,
  };

  let mut writer = NinjaWriter::new();
  let generated = project
    .generate(&mut writer, Some(&regenerate))
    .context("Failed to generate build graph")?;
  let text = writer.finish().context("Build graph is invalid")?;

  let target = root.join(&regenerate.output);
  write_atomic(&target, &text)?;
  debug!(path = %target.display(), bytes = text.len(), "wrote build graph");

  if generated.components.is_empty() {
    print_warning("Project declares no components");
  }
  print_success(&format!("Generated {}", target.display()));
  print_stat("Components", &generated.components.len().to_string());
  print_stat("Edges", &plural(generated.edges, "edge"));
  print_stat("Waves", &generated.waves.to_string());
  print_stat("Default", &generated.default_targets.join(" "));
  Ok(())
}

/// Command Ninja runs to regenerate the graph.
fn regenerate_command() -> Result<String> {
  let exe = std::env::current_exe()
    .ok()
    .and_then(|exe| dunce::canonicalize(exe).ok())
    .map(|exe| exe.to_string_lossy().into_owned())
    .unwrap_or_else(|| "bbgraph".to_string());
  let exe = shell::quote(&exe).context("Cannot quote the bbgraph executable path")?;
  Ok(format!("{} generate $in -o $out", escape(&exe)))
}

/// Write `text` to `path` via a temp file in the same directory.
fn write_atomic(path: &Path, text: &str) -> Result<()> {
  let dir = path.parent().unwrap_or(Path::new("."));
  let mut tmp =
    NamedTempFile::new_in(dir).with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
  tmp.write_all(text.as_bytes()).context("Failed to write build graph")?;
  tmp
    .persist(path)
    .with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn write_atomic_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("build.ninja");
    fs::write(&path, "old").unwrap();

    write_atomic(&path, "new").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
  }

  #[test]
  fn regenerate_command_uses_ninja_variables() {
    let command = regenerate_command().unwrap();
    assert!(command.ends_with(" generate $in -o $out"));
  }
}
