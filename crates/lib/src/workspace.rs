//! The action set of a configuration.
//!
//! A [`Workspace`] owns one clone action per cloneable component and one
//! configure/install pair per build, and wires the declared dependencies
//! between them.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::action::{Action, ActionRef};
use crate::config::{Build, Component, ConfigError, Configuration, parse_dependency};
use crate::remote::{GitLsRemote, RefLister};

/// The actions of one build.
#[derive(Debug, Clone)]
pub struct BuildActions {
  pub build: Build,
  pub configure: ActionRef,
  pub install: ActionRef,
}

#[derive(Debug)]
pub struct Workspace {
  config: Arc<Configuration>,
  clones: IndexMap<String, ActionRef>,
  builds: IndexMap<String, BuildActions>,
}

impl Workspace {
  pub fn new(config: Arc<Configuration>) -> Result<Self, ConfigError> {
    Self::with_lister(config, Arc::new(GitLsRemote))
  }

  /// Like [`new`](Self::new), listing remote heads through `lister`.
  pub fn with_lister(config: Arc<Configuration>, lister: Arc<dyn RefLister>) -> Result<Self, ConfigError> {
    let mut clones = IndexMap::new();
    let mut builds = IndexMap::new();

    for component in config.components() {
      let clone = Action::clone_component(component, Arc::clone(&config), Arc::clone(&lister));
      if let Some(clone) = &clone {
        clones.insert(component.name.clone(), Arc::clone(clone));
      }

      for build in component.builds() {
        let configure = Action::configure(build, clone.clone(), Arc::clone(&config));
        let install = Action::install(build, Arc::clone(&configure), Arc::clone(&config));
        builds.insert(
          build.qualified_name(),
          BuildActions {
            build: build.clone(),
            configure,
            install,
          },
        );
      }
    }

    let workspace = Self { config, clones, builds };
    workspace.resolve_dependencies()?;
    Ok(workspace)
  }

  /// Wire each build's declared dependencies to the install action they name.
  ///
  /// `dependencies` are needed to configure and at install time;
  /// `build_dependencies` only to configure.
  fn resolve_dependencies(&self) -> Result<(), ConfigError> {
    for actions in self.builds.values() {
      let build = &actions.build;
      let declared = build
        .dependencies
        .iter()
        .map(|dependency| (dependency, false))
        .chain(build.build_dependencies.iter().map(|dependency| (dependency, true)));

      for (dependency, build_only) in declared {
        let install = self.resolve_dependency(dependency)?;
        debug!(build = %build.qualified_name(), dependency = %install, build_only, "wiring dependency");

        actions.configure.add_explicit_dependency(Arc::clone(&install));
        if !build_only {
          actions.install.add_explicit_dependency(install);
        }
      }
    }
    Ok(())
  }

  /// The install action a dependency string refers to.
  ///
  /// `component~build` prefers `build` among the component's builds; with a
  /// single installed build per component this resolves like `component@build`.
  fn resolve_dependency(&self, dependency: &str) -> Result<ActionRef, ConfigError> {
    let spec = parse_dependency(dependency)?;
    let component = self
      .config
      .component(&spec.component)
      .ok_or_else(|| ConfigError::UnknownComponent(spec.component.clone()))?;

    let build = match &spec.build {
      Some(name) => component.build(name).ok_or_else(|| ConfigError::UnknownBuild {
        component: spec.component.clone(),
        build: name.clone(),
      })?,
      None => component.default_build(),
    };

    self
      .builds
      .get(&build.qualified_name())
      .map(|actions| Arc::clone(&actions.install))
      .ok_or_else(|| ConfigError::UnknownComponent(build.qualified_name()))
  }

  pub fn config(&self) -> &Arc<Configuration> {
    &self.config
  }

  pub fn components(&self) -> impl Iterator<Item = &Component> {
    self.config.components()
  }

  /// Actions of `component` (its default build) or `component@build`.
  pub fn get_build(&self, name: &str) -> Option<&BuildActions> {
    let build = self.config.get_build(name)?;
    self.builds.get(&build.qualified_name())
  }

  pub fn default_build(&self, component: &str) -> Option<&BuildActions> {
    let component = self.config.component(component)?;
    self.builds.get(&component.default_build().qualified_name())
  }

  /// Every build's actions, in declaration order.
  pub fn builds(&self) -> impl Iterator<Item = &BuildActions> {
    self.builds.values()
  }

  pub fn clone_action(&self, component: &str) -> Option<&ActionRef> {
    self.clones.get(component)
  }

  /// Install actions of every component's default build, or of every build.
  pub fn install_actions(&self, all_builds: bool) -> Vec<ActionRef> {
    if all_builds {
      self.builds.values().map(|actions| Arc::clone(&actions.install)).collect()
    } else {
      self
        .config
        .components()
        .filter_map(|component| self.default_build(&component.name))
        .map(|actions| Arc::clone(&actions.install))
        .collect()
    }
  }
}
