//! Stage catalog for the Yocto builder.
//!
//! Rule templates are registered once per graph. Every instance shares them
//! and only differs in the variables its edges bind.

use bbgraph_ninja::{GraphWriter, Rule};
use tracing::debug;

use crate::error::CoreError;

pub const INIT_ENV: &str = "yocto_init_env";
pub const ADD_LAYERS: &str = "yocto_add_layers";
pub const UPDATE_CONF: &str = "yocto_update_conf";
pub const BUILD: &str = "yocto_build";

/// File the configuration stage writes next to `local.conf`.
pub const GENERATED_CONF: &str = "bbgraph.conf";

/// Stages of one Yocto instance, in execution order.
///
/// An instance moves strictly forward through them:
/// `InitEnv -> AddLayers -> UpdateConf -> Build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
  InitEnv,
  AddLayers,
  UpdateConf,
  Build,
}

impl Stage {
  pub const ALL: [Stage; 4] = [Stage::InitEnv, Stage::AddLayers, Stage::UpdateConf, Stage::Build];

  /// Stage name used in marker paths and logs.
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::InitEnv => "env",
      Stage::AddLayers => "layers",
      Stage::UpdateConf => "conf",
      Stage::Build => "build",
    }
  }

  pub fn rule_name(&self) -> &'static str {
    match self {
      Stage::InitEnv => INIT_ENV,
      Stage::AddLayers => ADD_LAYERS,
      Stage::UpdateConf => UPDATE_CONF,
      Stage::Build => BUILD,
    }
  }

  pub fn next(&self) -> Option<Stage> {
    match self {
      Stage::InitEnv => Some(Stage::AddLayers),
      Stage::AddLayers => Some(Stage::UpdateConf),
      Stage::UpdateConf => Some(Stage::Build),
      Stage::Build => None,
    }
  }

  pub fn rule(&self) -> Rule {
    match self {
      Stage::InitEnv => Rule::new(INIT_ENV, &bash(&[SOURCE_ENV[0], SOURCE_ENV[1]]))
        .with_description("Initialize Yocto build environment"),
      Stage::AddLayers => Rule::new(
        ADD_LAYERS,
        &format!(
          "{} && touch $out",
          bash(&[
            SOURCE_ENV[0],
            SOURCE_ENV[1],
            "if [ -n '$layers' ]; then bitbake-layers add-layer $layers; fi",
          ])
        ),
      )
      .with_description("Add yocto layers")
      .with_pool("console"),
      Stage::UpdateConf => Rule::new(UPDATE_CONF, &update_conf_command()).with_description("Update local.conf"),
      Stage::Build => Rule::new(BUILD, &bash(&[SOURCE_ENV[0], SOURCE_ENV[1], "bitbake $target"]))
        .with_description("Yocto Build: $name")
        .with_pool("console")
        .with_restat(),
    }
  }
}

impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Steps every stage that talks to bitbake starts with.
const SOURCE_ENV: [&str; 2] = ["cd $yocto_dir", "source poky/oe-init-build-env $work_dir"];

fn bash(steps: &[&str]) -> String {
  format!("bash -c \"{}\"", steps.join(" && "))
}

fn update_conf_command() -> String {
  let conf = format!("$work_dir/conf/{GENERATED_CONF}");
  [
    "cd $yocto_dir".to_string(),
    format!("echo '# Code generated by bbgraph. All manual changes will be lost' > {conf}"),
    format!("for x in $conf; do printf '%s\\n' \"$$x\" >> {conf}; done"),
    format!("sed \"/require {}/d\" -i $work_dir/conf/local.conf", GENERATED_CONF.replace('.', "\\.")),
    format!("echo 'require {GENERATED_CONF}' >> $work_dir/conf/local.conf"),
  ]
  .join(" && ")
}

/// Register the four stage rules on `writer`.
///
/// Rules that are already registered are left alone, so calling this once
/// per instance is harmless. Returns how many rules were added.
pub fn register(writer: &mut dyn GraphWriter) -> Result<usize, CoreError> {
  let mut added = 0;
  for stage in Stage::ALL {
    if writer.has_rule(stage.rule_name()) {
      continue;
    }
    writer.declare_rule(stage.rule())?;
    added += 1;
  }
  if added > 0 {
    writer.blank_line();
    debug!(added, "registered yocto stage rules");
  }
  Ok(added)
}

/// Fail unless every stage rule is available on `writer`.
pub fn ensure_registered(writer: &dyn GraphWriter) -> Result<(), CoreError> {
  match Stage::ALL.iter().find(|stage| !writer.has_rule(stage.rule_name())) {
    Some(stage) => Err(CoreError::RulesNotRegistered(stage.rule_name().to_string())),
    None => Ok(()),
  }
}
