use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use orchestra_lib::action::{Action, RunOptions};

use super::load_workspace;
use crate::output::{print_info, print_success};

const CLEAN_SCRIPT: &str = r#"rm -rf "$BUILD_DIR""#;

/// Remove the build directory of `component` (or `component@build`).
pub fn cmd_clean(config: Option<&Path>, component: &str, pretend: bool) -> Result<()> {
  let workspace = load_workspace(config)?;
  let actions = workspace
    .get_build(component)
    .with_context(|| format!("Unknown component or build {component}"))?;

  let action = Action::for_build("clean", &actions.build, CLEAN_SCRIPT, Arc::clone(workspace.config()));
  let build_dir = action
    .build_dir()
    .with_context(|| format!("{component} has no build directory"))?;

  let options = RunOptions {
    pretend,
    explicitly_requested: true,
  };
  action
    .run(&options)
    .with_context(|| format!("Failed to clean {component}"))?;

  if pretend {
    print_info(&format!("Would remove {}", build_dir.display()));
  } else {
    print_success(&format!("Removed {}", build_dir.display()));
  }
  Ok(())
}
