//! In-memory Ninja writer.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::NinjaError;
use crate::graph::BuildGraph;
use crate::syntax::escape_path;
use crate::types::{Edge, Rule};

/// Ninja's built-in alias rule.
pub const PHONY: &str = "phony";

/// Sink for rule templates and build edges.
///
/// Generators only talk to this trait, so the graph can be recorded,
/// inspected or rendered without the generator knowing which.
pub trait GraphWriter {
  /// Register a rule template. Each name may be declared once per graph.
  fn declare_rule(&mut self, rule: Rule) -> Result<(), NinjaError>;

  /// Whether a rule with this name can be referenced by edges.
  fn has_rule(&self, name: &str) -> bool;

  /// Append a build edge. Its rule must already be declared.
  fn declare_edge(&mut self, edge: Edge) -> Result<(), NinjaError>;

  fn blank_line(&mut self);
}

#[derive(Debug, Clone)]
enum Statement {
  Comment(String),
  Variable { key: String, value: String },
  Rule(Rule),
  Edge(Edge),
  Default(Vec<String>),
  Blank,
}

/// Collects statements and renders them as `build.ninja` text.
#[derive(Debug, Default)]
pub struct NinjaWriter {
  statements: Vec<Statement>,
  rules: BTreeSet<String>,
}

impl NinjaWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn comment(&mut self, text: &str) {
    for line in text.lines() {
      self.statements.push(Statement::Comment(line.to_string()));
    }
  }

  /// Top-level `key = value` binding. The value is written verbatim.
  pub fn variable(&mut self, key: &str, value: &str) {
    self.statements.push(Statement::Variable {
      key: key.to_string(),
      value: value.to_string(),
    });
  }

  pub fn default_targets<S: AsRef<str>>(&mut self, targets: impl IntoIterator<Item = S>) {
    let targets: Vec<String> = targets.into_iter().map(|t| t.as_ref().to_string()).collect();
    if !targets.is_empty() {
      self.statements.push(Statement::Default(targets));
    }
  }

  /// Edges declared so far, in declaration order.
  pub fn edges(&self) -> impl Iterator<Item = &Edge> {
    self.statements.iter().filter_map(|s| match s {
      Statement::Edge(edge) => Some(edge),
      _ => None,
    })
  }

  pub fn edge_count(&self) -> usize {
    self.edges().count()
  }

  /// Dependency graph over the edges declared so far.
  pub fn graph(&self) -> Result<BuildGraph, NinjaError> {
    let edges: Vec<Edge> = self.edges().cloned().collect();
    BuildGraph::from_edges(&edges)
  }

  /// Render the declared statements as Ninja text.
  pub fn render(&self) -> String {
    let mut out = String::new();
    for statement in &self.statements {
      match statement {
        Statement::Comment(text) => {
          out.push_str("# ");
          out.push_str(text);
          out.push('\n');
        }
        Statement::Variable { key, value } => push_variable(&mut out, key, value, 0),
        Statement::Rule(rule) => render_rule(&mut out, rule),
        Statement::Edge(edge) => render_edge(&mut out, edge),
        Statement::Default(targets) => {
          out.push_str("default ");
          out.push_str(&join_paths(targets));
          out.push('\n');
        }
        Statement::Blank => out.push('\n'),
      }
    }
    out
  }

  /// Validate the graph and render it.
  ///
  /// Nothing is returned when validation fails, so callers never see text
  /// for a graph Ninja would refuse.
  pub fn finish(&self) -> Result<String, NinjaError> {
    let graph = self.graph()?;
    debug!(edges = graph.len(), rules = self.rules.len(), "validated build graph");
    Ok(self.render())
  }
}

impl GraphWriter for NinjaWriter {
  fn declare_rule(&mut self, rule: Rule) -> Result<(), NinjaError> {
    if rule.name == PHONY || !self.rules.insert(rule.name.clone()) {
      return Err(NinjaError::DuplicateRule(rule.name));
    }
    self.statements.push(Statement::Rule(rule));
    Ok(())
  }

  fn has_rule(&self, name: &str) -> bool {
    name == PHONY || self.rules.contains(name)
  }

  fn declare_edge(&mut self, edge: Edge) -> Result<(), NinjaError> {
    let Some(first) = edge.outputs.first() else {
      return Err(NinjaError::NoOutputs(edge.rule));
    };
    if !self.has_rule(&edge.rule) {
      return Err(NinjaError::UnknownRule {
        rule: edge.rule.clone(),
        output: first.clone(),
      });
    }
    edge.validate()?;
    self.statements.push(Statement::Edge(edge));
    Ok(())
  }

  fn blank_line(&mut self) {
    self.statements.push(Statement::Blank);
  }
}

fn push_variable(out: &mut String, key: &str, value: &str, indent: usize) {
  for _ in 0..indent {
    out.push_str("  ");
  }
  out.push_str(key);
  out.push_str(" = ");
  out.push_str(value);
  out.push('\n');
}

fn join_paths(paths: &[String]) -> String {
  paths.iter().map(|p| escape_path(p)).collect::<Vec<_>>().join(" ")
}

fn render_rule(out: &mut String, rule: &Rule) {
  out.push_str("rule ");
  out.push_str(&rule.name);
  out.push('\n');
  push_variable(out, "command", &rule.command, 1);
  if let Some(description) = &rule.description {
    push_variable(out, "description", description, 1);
  }
  if rule.generator {
    push_variable(out, "generator", "1", 1);
  }
  if let Some(pool) = &rule.pool {
    push_variable(out, "pool", pool, 1);
  }
  if rule.restat {
    push_variable(out, "restat", "1", 1);
  }
}

fn render_edge(out: &mut String, edge: &Edge) {
  out.push_str("build ");
  out.push_str(&join_paths(&edge.outputs));
  out.push_str(": ");
  out.push_str(&edge.rule);
  if !edge.inputs.is_empty() {
    out.push(' ');
    out.push_str(&join_paths(&edge.inputs));
  }
  out.push('\n');
  for (key, value) in &edge.variables {
    push_variable(out, key, value, 1);
  }
}
