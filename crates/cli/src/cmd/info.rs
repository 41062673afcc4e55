use bbgraph_core::SUPPORTED_BUILDERS;
use bbgraph_core::fetch::SUPPORTED_FETCHERS;
use bbgraph_core::project::NINJA_REQUIRED_VERSION;

use crate::output::print_stat;

pub fn cmd_info() {
  println!("bbgraph {}", env!("CARGO_PKG_VERSION"));
  print_stat("Builders", &SUPPORTED_BUILDERS.join(", "));
  print_stat("Source types", &SUPPORTED_FETCHERS.join(", "));
  print_stat("Ninja", &format!(">= {NINJA_REQUIRED_VERSION}"));
}
