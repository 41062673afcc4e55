//! Implementation of the `bbgraph check` command.
//!
//! Runs the full generation into memory, validates the resulting graph and
//! reports what each component would produce. Nothing is written to disk.
//! The root is derived from `--output` exactly as `generate` derives it.

use std::path::Path;

use anyhow::{Context, Result};
use bbgraph_ninja::NinjaWriter;

use super::{generation_root, load_project};
use crate::output::{OutputFormat, plural, print_info, print_json, print_outputs, print_success};

pub fn cmd_check(file: &Path, output: &Path, format: OutputFormat) -> Result<()> {
  let (root, _) = generation_root(output, false)?;
  let project = load_project(file, &root)?;

  let mut writer = NinjaWriter::new();
  let generated = project.generate(&mut writer, None).context("Failed to generate build graph")?;

  if format.is_json() {
    let report = serde_json::json!({
      "project": file.display().to_string(),
      "desc": project.desc(),
      "root": root.display().to_string(),
      "components": generated.components,
      "default_targets": generated.default_targets,
      "edges": generated.edges,
      "waves": generated.waves,
    });
    return print_json(&report);
  }

  print_success(&format!("{} is valid: {}", file.display(), project.desc()));
  for component in &generated.components {
    print_info(&format!(
      "{} ({})",
      component.name,
      plural(component.outputs.len(), "output")
    ));
    print_outputs(&component.outputs);
  }
  println!();
  println!("Root: {}", root.display());
  println!("Edges: {}", generated.edges);
  println!("Waves: {}", generated.waves);
  println!("Default: {}", generated.default_targets.join(" "));
  Ok(())
}
