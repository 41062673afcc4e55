//! bbgraph-core: turn Yocto build descriptions into Ninja graphs
//!
//! This crate provides:
//! - `yocto`: the four-stage Yocto builder (rule catalog, configuration
//!   flattening, stage composition)
//! - `fetch`: source fetchers whose stamps gate the first build stage
//! - `project`: whole-project generation (components, aliases, defaults)
//! - `marker`: synthetic stamp paths that sequence stages
//! - `shell` and `paths`: quoting and lexical path helpers

mod builder;
mod error;
pub mod fetch;
pub mod marker;
pub mod paths;
pub mod project;
pub mod shell;
pub mod yocto;

pub use builder::{Builder, SUPPORTED_BUILDERS, create_builder, register_builder_rules};
pub use error::CoreError;
pub use marker::MarkerId;
pub use project::{ComponentOutputs, Generated, Project, Regenerate};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
