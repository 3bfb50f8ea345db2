use std::path::Path;

use anyhow::{Context, Result, bail};

use orchestra_lib::action::RunOptions;

use super::load_workspace;
use crate::output::{print_info, print_success};

pub fn cmd_clone(config: Option<&Path>, component: &str, pretend: bool) -> Result<()> {
  let workspace = load_workspace(config)?;

  if workspace.config().component(component).is_none() {
    bail!("Unknown component {component}");
  }
  let action = workspace
    .clone_action(component)
    .with_context(|| format!("Component {component} has no repository to clone"))?;

  let source_dir = action.source_dir();
  if action.is_satisfied()? {
    print_info(&format!("{component} is already cloned in {}", source_dir.display()));
    return Ok(());
  }

  let options = RunOptions {
    pretend,
    explicitly_requested: true,
  };
  action
    .run(&options)
    .with_context(|| format!("Failed to clone {component}"))?;

  if pretend {
    print_info(&format!("Would clone {component} into {}", source_dir.display()));
  } else {
    print_success(&format!("Cloned {component} into {}", source_dir.display()));
  }
  Ok(())
}
