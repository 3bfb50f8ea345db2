mod clean;
mod clone;
mod components;
mod graph;
mod shell;
mod update;

pub use clean::cmd_clean;
pub use clone::cmd_clone;
pub use components::cmd_components;
pub use graph::cmd_graph;
pub use shell::cmd_shell;
pub use update::cmd_update;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use orchestra_lib::config::Configuration;
use orchestra_lib::workspace::Workspace;

/// Locate and load the configuration.
fn load_config(config: Option<&Path>) -> Result<Configuration> {
  let path = Configuration::discover(config)?;
  debug!(path = %path.display(), "using configuration");
  Configuration::from_file(&path).with_context(|| format!("Failed to load configuration {}", path.display()))
}

/// Load the configuration and wire its actions.
fn load_workspace(config: Option<&Path>) -> Result<Workspace> {
  let configuration = load_config(config)?;
  Workspace::new(Arc::new(configuration)).context("Failed to resolve component dependencies")
}
