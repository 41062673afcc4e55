mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::{OutputFormat, print_error};

/// bbgraph - Ninja build graphs for Yocto-based projects
#[derive(Parser)]
#[command(name = "bbgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (RUST_LOG takes precedence)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate build.ninja from a project file
  Generate {
    /// Path to the project file
    #[arg(default_value = "build.yaml")]
    project: PathBuf,

    /// Where to write the build graph
    #[arg(short, long, default_value = "build.ninja")]
    output: PathBuf,
  },

  /// Validate a project file without writing anything
  Check {
    /// Path to the project file
    #[arg(default_value = "build.yaml")]
    project: PathBuf,

    /// Where the build graph would be written; fixes the generation root
    #[arg(short, long, default_value = "build.ninja")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Show supported builders and source types
  Info,
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Generate { project, output } => cmd::cmd_generate(&project, &output),
    Commands::Check { project, output, format } => cmd::cmd_check(&project, &output, format),
    Commands::Info => {
      cmd::cmd_info();
      Ok(())
    }
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
