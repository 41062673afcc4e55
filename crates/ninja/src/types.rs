//! Rule templates and build edges.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::NinjaError;

/// A Ninja rule: a parametrized command template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
  pub name: String,
  pub command: String,
  pub description: Option<String>,
  /// Ninja pool; `console` gives the command direct terminal access.
  pub pool: Option<String>,
  /// Re-stat outputs after running so unchanged outputs do not dirty dependents.
  pub restat: bool,
  /// Marks the rule as regenerating the build file itself.
  pub generator: bool,
}

impl Rule {
  pub fn new(name: &str, command: &str) -> Self {
    Self {
      name: name.to_string(),
      command: command.to_string(),
      description: None,
      pool: None,
      restat: false,
      generator: false,
    }
  }

  pub fn with_description(mut self, description: &str) -> Self {
    self.description = Some(description.to_string());
    self
  }

  pub fn with_pool(mut self, pool: &str) -> Self {
    self.pool = Some(pool.to_string());
    self
  }

  pub fn with_restat(mut self) -> Self {
    self.restat = true;
    self
  }

  pub fn as_generator(mut self) -> Self {
    self.generator = true;
    self
  }
}

/// A build edge: outputs produced by running `rule` over `inputs`.
///
/// Variable values are written verbatim; callers escape `$` themselves when
/// a literal dollar is meant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
  pub outputs: Vec<String>,
  pub rule: String,
  pub inputs: Vec<String>,
  pub variables: BTreeMap<String, String>,
}

fn path_string(path: impl AsRef<Path>) -> String {
  path.as_ref().to_string_lossy().into_owned()
}

impl Edge {
  pub fn new(rule: &str) -> Self {
    Self {
      outputs: Vec::new(),
      rule: rule.to_string(),
      inputs: Vec::new(),
      variables: BTreeMap::new(),
    }
  }

  pub fn output(mut self, path: impl AsRef<Path>) -> Self {
    self.outputs.push(path_string(path));
    self
  }

  pub fn outputs<P: AsRef<Path>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
    self.outputs.extend(paths.into_iter().map(path_string));
    self
  }

  pub fn input(mut self, path: impl AsRef<Path>) -> Self {
    self.inputs.push(path_string(path));
    self
  }

  pub fn inputs<P: AsRef<Path>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
    self.inputs.extend(paths.into_iter().map(path_string));
    self
  }

  pub fn variable(mut self, key: &str, value: impl Into<String>) -> Self {
    self.variables.insert(key.to_string(), value.into());
    self
  }

  pub fn variables(mut self, vars: &BTreeMap<String, String>) -> Self {
    self.variables.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    self
  }

  /// Check that every variable renders as a single `key = value` line.
  ///
  /// Ninja has no escape for a line break inside a value, so such an edge
  /// cannot be written at all.
  pub fn validate(&self) -> Result<(), NinjaError> {
    match self.variables.iter().find(|(_, value)| value.contains(['\n', '\r'])) {
      Some((variable, _)) => Err(NinjaError::LineBreak {
        output: self.outputs.first().cloned().unwrap_or_default(),
        variable: variable.clone(),
      }),
      None => Ok(()),
    }
  }
}
