//! Yocto builder.
//!
//! A Yocto build is driven in four stages, each a Ninja edge:
//!
//! 1. `yocto_init_env` - run `oe-init-build-env` to create the work directory
//! 2. `yocto_add_layers` - register layers with `bitbake-layers`
//! 3. `yocto_update_conf` - write the generated configuration file
//! 4. `yocto_build` - run `bitbake` for the build target
//!
//! # Submodules
//!
//! - [`rules`] - stage catalog and rule templates
//! - [`conf`] - directive flattening and escaping
//! - [`builder`] - per-instance stage composition

pub mod builder;
pub mod conf;
pub mod rules;

pub use builder::{StagePlan, YoctoBuilder};
pub use conf::{Directive, DirectiveEntry, ExternalSource, LocalConf, OVERRIDE_PREFIX};
pub use rules::Stage;
