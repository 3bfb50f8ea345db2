use std::path::Path;

use anyhow::{Context, Result};

use orchestra_lib::graph::DependencyGraph;

use super::load_workspace;

/// Print the dependency graph of `component`'s install action, or of every
/// component's.
pub fn cmd_graph(config: Option<&Path>, component: Option<&str>, all_builds: bool) -> Result<()> {
  let workspace = load_workspace(config)?;

  let roots = match component {
    Some(name) => {
      let actions = workspace
        .get_build(name)
        .with_context(|| format!("Unknown component or build {name}"))?;
      vec![actions.install.clone()]
    }
    None => workspace.install_actions(all_builds),
  };

  let graph = DependencyGraph::from_roots(&roots);
  let text = graph.render().context("Failed to evaluate the dependency graph")?;
  print!("{text}");
  Ok(())
}
