//! orchestra: build components from source, in dependency order.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use orchestra_lib::script;

use crate::output::{OutputFormat, print_error};

#[derive(Parser)]
#[command(name = "orchestra")]
#[command(author, version, about = "Build components from source, in dependency order", long_about = None)]
struct Cli {
  /// Configuration file (default: $ORCHESTRA_CONFIG, then ./orchestra.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true, conflicts_with = "quiet")]
  verbose: bool,

  /// Only log warnings and errors, and capture the output of user scripts
  #[arg(short, long, global = true)]
  quiet: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the dependency graph of install actions in dot format
  Graph {
    /// Only graph this component (`component` or `component@build`)
    component: Option<String>,

    /// Graph every build instead of each component's default build
    #[arg(long, conflicts_with = "component")]
    all_builds: bool,
  },

  /// Run a command (default: your login shell) in the orchestra environment
  Shell {
    /// Use this build's environment and start in its build directory
    #[arg(short, long)]
    component: Option<String>,

    /// Command and arguments to run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
  },

  /// Clone the sources of a component
  Clone {
    component: String,

    /// Log what would run without cloning
    #[arg(long)]
    pretend: bool,
  },

  /// Remove the build directory of a component
  Clean {
    /// `component` or `component@build`
    component: String,

    /// Log what would run without removing anything
    #[arg(long)]
    pretend: bool,
  },

  /// Rebuild the cache of remote branch heads
  Update {
    /// Repositories listed concurrently
    #[arg(short = 'j', long, default_value_t = 8)]
    parallelism: usize,
  },

  /// List components, their builds and what is installed
  Components {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

fn init_logging(verbose: bool, quiet: bool) {
  let default_level = if verbose {
    "debug"
  } else if quiet {
    "warn"
  } else {
    "info"
  };

  let filter = std::env::var("ORCHESTRA_LOG")
    .or_else(|_| std::env::var("RUST_LOG"))
    .ok()
    .and_then(|directives| EnvFilter::try_new(directives).ok())
    .unwrap_or_else(|| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let config = cli.config.as_deref();

  match cli.command {
    Commands::Graph { component, all_builds } => cmd::cmd_graph(config, component.as_deref(), all_builds),
    Commands::Shell { component, command } => cmd::cmd_shell(config, component.as_deref(), &command),
    Commands::Clone { component, pretend } => cmd::cmd_clone(config, &component, pretend),
    Commands::Clean { component, pretend } => cmd::cmd_clean(config, &component, pretend),
    Commands::Update { parallelism } => cmd::cmd_update(config, parallelism),
    Commands::Components { output } => cmd::cmd_components(config, cli.verbose, output),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose, cli.quiet);
  script::set_quiet(cli.quiet);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
