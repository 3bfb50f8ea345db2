//! Implementation of the `orchestra components` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use orchestra_lib::remote::{GitLsRemote, RemoteHeadsCache};

use super::load_workspace;
use crate::output::{OutputFormat, print_json, symbols, truncate_hash};

#[derive(Debug, Serialize)]
struct BuildEntry {
  component: String,
  build: String,
  default: bool,
  /// `None` for components without a repository.
  cloned: Option<bool>,
  installed: bool,
}

pub fn cmd_components(config: Option<&Path>, verbose: bool, output: OutputFormat) -> Result<()> {
  let workspace = load_workspace(config)?;

  let mut entries = Vec::new();
  for actions in workspace.builds() {
    let component = &actions.build.component;
    let default = workspace
      .default_build(component)
      .is_some_and(|default| default.install.id() == actions.install.id());
    let cloned = workspace
      .clone_action(component)
      .map(|clone| clone.is_satisfied())
      .transpose()?;

    entries.push(BuildEntry {
      component: component.clone(),
      build: actions.build.name.clone(),
      default,
      cloned,
      installed: actions.install.is_satisfied()?,
    });
  }

  if output.is_json() {
    return print_json(&entries);
  }

  let cache = if verbose {
    Some(
      RemoteHeadsCache::load(Arc::clone(workspace.config()), Arc::new(GitLsRemote))
        .context("Failed to load the remote HEADs cache")?,
    )
  } else {
    None
  };

  for component in workspace.components() {
    let state = match workspace.clone_action(&component.name).map(|clone| clone.is_satisfied()).transpose()? {
      Some(true) => " (cloned)",
      Some(false) => " (not cloned)",
      None => "",
    };
    println!(
      "{}{}",
      component.name.if_supports_color(Stream::Stdout, |s| s.bold()),
      state.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );

    for entry in entries.iter().filter(|e| e.component == component.name) {
      let symbol = if entry.installed {
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
      } else {
        symbols::INFO.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string()
      };
      let marker = if entry.default { " (default)" } else { "" };
      println!("  {symbol} {}{marker}", entry.build);
    }

    if let Some(heads) = cache.as_ref().and_then(|cache| cache.heads(&component.name)) {
      for (branch, commit) in heads {
        println!(
          "    {} {branch} {}",
          symbols::ARROW,
          truncate_hash(commit).if_supports_color(Stream::Stdout, |s| s.dimmed())
        );
      }
    }
  }

  Ok(())
}
