//! Actions: units of work bound to components and builds.
//!
//! An [`Action`] is a named script attached to a target (a component or a
//! build), with a set of dependencies that must complete before it runs.
//! Actions are created once per `(kind, target)` by the
//! [`Workspace`](crate::workspace::Workspace) and shared as [`ActionRef`]s.
//!
//! # Variants
//!
//! - [`ActionKind::Component`] / [`ActionKind::Build`]: a plain script for a
//!   component or a build. They cannot tell whether they are satisfied.
//! - [`ActionKind::Clone`]: clones the component sources from the mirrors.
//! - [`ActionKind::Configure`]: prepares `BUILD_DIR`; depends on the clone.
//! - [`ActionKind::Install`]: installs a build into the root; depends on the
//!   configure action.
//!
//! # Dependencies
//!
//! `dependencies` is the union of the explicit dependencies (wired after
//! construction) and the implicit ones each variant brings. The set used for
//! hashing may leave some implicit dependencies out: a configure action
//! depends on the clone only for ordering, and the sources enter its hash
//! through the remote head instead.
//!
//! # Environment
//!
//! Every action extends the global environment with `SOURCE_DIR`; build
//! actions add `BUILD_DIR` and `TMP_ROOT`. The environment is recomputed on
//! every access.

mod build;
mod clone;
mod types;

pub use build::*;
pub use clone::CloneAction;
pub use types::*;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::config::{Build, Component, Configuration};
use crate::consts::{BUILD_DIR_VAR, SOURCE_DIR_VAR, TMP_ROOT_VAR, TMP_ROOTS_VAR};
use crate::environment::Environment;
use crate::remote::RefLister;
use crate::script::{self, Encoding, ScriptError};
use crate::util::hash::hash_fields;

/// What an action does and what it targets.
#[derive(Debug)]
pub enum ActionKind {
  /// A script run for a component.
  Component { component: String },
  /// A script run for one build of a component.
  Build { build: Build },
  Clone(CloneAction),
  Configure { build: Build, clone: Option<ActionRef> },
  Install { build: Build, configure: ActionRef },
}

pub struct Action {
  id: ActionId,
  name: String,
  config: Arc<Configuration>,
  script: Option<String>,
  kind: ActionKind,
  explicit_dependencies: RwLock<DependencySet>,
}

impl Action {
  fn new(name: impl Into<String>, config: Arc<Configuration>, script: Option<String>, kind: ActionKind) -> ActionRef {
    Arc::new(Self {
      id: ActionId::next(),
      name: name.into(),
      config,
      script,
      kind,
      explicit_dependencies: RwLock::new(DependencySet::new()),
    })
  }

  pub fn for_component(
    name: impl Into<String>,
    component: &Component,
    script: impl Into<String>,
    config: Arc<Configuration>,
  ) -> ActionRef {
    let kind = ActionKind::Component {
      component: component.name.clone(),
    };
    Self::new(name, config, Some(script.into()), kind)
  }

  pub fn for_build(
    name: impl Into<String>,
    build: &Build,
    script: impl Into<String>,
    config: Arc<Configuration>,
  ) -> ActionRef {
    let kind = ActionKind::Build { build: build.clone() };
    Self::new(name, config, Some(script.into()), kind)
  }

  /// The clone action of `component`, or `None` if it declares no repository.
  pub fn clone_component(
    component: &Component,
    config: Arc<Configuration>,
    lister: Arc<dyn RefLister>,
  ) -> Option<ActionRef> {
    let repository = component.repository.clone()?;
    let kind = ActionKind::Clone(CloneAction::new(component.name.clone(), repository, lister));
    Some(Self::new("clone", config, None, kind))
  }

  pub fn configure(build: &Build, clone: Option<ActionRef>, config: Arc<Configuration>) -> ActionRef {
    let kind = ActionKind::Configure {
      build: build.clone(),
      clone,
    };
    Self::new("configure", config, Some(build.configure.clone()), kind)
  }

  pub fn install(build: &Build, configure: ActionRef, config: Arc<Configuration>) -> ActionRef {
    let kind = ActionKind::Install {
      build: build.clone(),
      configure,
    };
    Self::new("install", config, Some(build.install.clone()), kind)
  }

  pub fn id(&self) -> ActionId {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> &ActionKind {
    &self.kind
  }

  pub fn config(&self) -> &Configuration {
    &self.config
  }

  pub fn component_name(&self) -> &str {
    match &self.kind {
      ActionKind::Component { component } => component,
      ActionKind::Clone(clone) => &clone.component,
      ActionKind::Build { build } | ActionKind::Configure { build, .. } | ActionKind::Install { build, .. } => {
        &build.component
      }
    }
  }

  /// The build this action belongs to, for build-scoped variants.
  pub fn build(&self) -> Option<&Build> {
    match &self.kind {
      ActionKind::Build { build } | ActionKind::Configure { build, .. } | ActionKind::Install { build, .. } => {
        Some(build)
      }
      ActionKind::Component { .. } | ActionKind::Clone(_) => None,
    }
  }

  pub fn as_clone(&self) -> Option<&CloneAction> {
    match &self.kind {
      ActionKind::Clone(clone) => Some(clone),
      _ => None,
    }
  }

  /// The script this action runs. Clone scripts are synthesized from the mirrors.
  pub fn script(&self) -> Cow<'_, str> {
    match (&self.kind, &self.script) {
      (ActionKind::Clone(clone), _) => Cow::Owned(clone.script(&self.config)),
      (_, Some(script)) => Cow::Borrowed(script),
      (_, None) => Cow::Borrowed(""),
    }
  }

  /// Component name, or `component@build` for build-scoped actions.
  pub fn target_name(&self) -> String {
    match self.build() {
      Some(build) => build.qualified_name(),
      None => self.component_name().to_string(),
    }
  }

  pub fn name_for_info(&self) -> String {
    format!("{} {}", self.name, self.target_name())
  }

  pub fn name_for_graph(&self) -> String {
    self.name_for_info()
  }

  pub fn name_for_components(&self) -> String {
    self.target_name()
  }

  /// Add `dependency` to the explicit set. Returns false if it was already there.
  pub fn add_explicit_dependency(&self, dependency: ActionRef) -> bool {
    self
      .explicit_dependencies
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(dependency)
  }

  pub fn explicit_dependencies(&self) -> DependencySet {
    self
      .explicit_dependencies
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn implicit_dependencies(&self) -> DependencySet {
    match &self.kind {
      ActionKind::Configure { clone: Some(clone), .. } => DependencySet::from_iter([Arc::clone(clone)]),
      ActionKind::Install { configure, .. } => DependencySet::from_iter([Arc::clone(configure)]),
      _ => DependencySet::new(),
    }
  }

  pub fn implicit_dependencies_for_hash(&self) -> DependencySet {
    match &self.kind {
      ActionKind::Configure { .. } => DependencySet::new(),
      _ => self.implicit_dependencies(),
    }
  }

  pub fn dependencies(&self) -> DependencySet {
    self.explicit_dependencies().union(&self.implicit_dependencies())
  }

  pub fn dependencies_for_hash(&self) -> DependencySet {
    self
      .explicit_dependencies()
      .union(&self.implicit_dependencies_for_hash())
  }

  pub fn source_dir(&self) -> PathBuf {
    self.config.sources_dir.join(self.component_name())
  }

  pub fn build_dir(&self) -> Option<PathBuf> {
    self
      .build()
      .map(|build| self.config.builds_dir.join(&build.component).join(&build.name))
  }

  /// The global environment extended with this action's variables.
  pub fn environment(&self) -> Environment {
    let mut env = self.config.global_env();
    env.set(SOURCE_DIR_VAR, self.source_dir().to_string_lossy());

    if let (Some(build), Some(build_dir)) = (self.build(), self.build_dir()) {
      env.set(BUILD_DIR_VAR, build_dir.to_string_lossy());
      let tmp_roots = env
        .get(TMP_ROOTS_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| self.config.tmproot.clone());
      env.set(TMP_ROOT_VAR, tmp_roots.join(build.safe_name()).to_string_lossy());
    }

    env
  }

  /// Whether the effect of this action is already present.
  pub fn is_satisfied(&self) -> Result<bool, ActionError> {
    match &self.kind {
      ActionKind::Component { .. } | ActionKind::Build { .. } => Err(ActionError::Unimplemented {
        action: self.to_string(),
        operation: "is_satisfied",
      }),
      ActionKind::Clone(_) => Ok(self.source_dir().exists()),
      ActionKind::Configure { .. } => Ok(self.build_dir().is_some_and(|dir| dir.exists())),
      ActionKind::Install { build, .. } => {
        let metadata = read_install_metadata(&self.config.installed_component_path(&build.component));
        Ok(metadata.is_some_and(|metadata| metadata.build_name == build.name))
      }
    }
  }

  /// Satisfied, and so is every dependency, transitively.
  pub fn is_satisfied_recursively(&self) -> Result<bool, ActionError> {
    self.satisfied_recursively(&mut HashMap::new(), &mut HashSet::new())
  }

  /// Every dependency is satisfied recursively.
  pub fn can_run(&self) -> Result<bool, ActionError> {
    let mut memo = HashMap::new();
    let mut in_progress = HashSet::from([self.id]);
    for dependency in self.dependencies().iter() {
      if !dependency.satisfied_recursively(&mut memo, &mut in_progress)? {
        return Ok(false);
      }
    }
    Ok(true)
  }

  pub(crate) fn satisfied_recursively(
    &self,
    memo: &mut HashMap<ActionId, bool>,
    in_progress: &mut HashSet<ActionId>,
  ) -> Result<bool, ActionError> {
    if let Some(satisfied) = memo.get(&self.id) {
      return Ok(*satisfied);
    }
    if !in_progress.insert(self.id) {
      return Err(ActionError::Cycle {
        action: self.to_string(),
      });
    }

    let mut satisfied = self.is_satisfied()?;
    if satisfied {
      for dependency in self.dependencies().iter() {
        if !dependency.satisfied_recursively(memo, in_progress)? {
          satisfied = false;
          break;
        }
      }
    }

    in_progress.remove(&self.id);
    memo.insert(self.id, satisfied);
    Ok(satisfied)
  }

  /// Head commit of the sources this action builds, if known.
  ///
  /// Clone actions query their remotes; configure actions ask their clone.
  pub fn remote_head(&self) -> Option<String> {
    match &self.kind {
      ActionKind::Clone(clone) => clone.get_remote_head(&self.config, &self.source_dir(), &self.environment()),
      ActionKind::Configure { clone: Some(clone), .. } => clone.remote_head(),
      _ => None,
    }
  }

  /// SHA-256 over this action's name, target, script and remote head and the
  /// recursive hashes of [`dependencies_for_hash`](Self::dependencies_for_hash).
  pub fn recursive_hash(&self) -> Result<String, ActionError> {
    self.recursive_hash_with(&mut HashMap::new(), &mut HashSet::new())
  }

  fn recursive_hash_with(
    &self,
    memo: &mut HashMap<ActionId, String>,
    in_progress: &mut HashSet<ActionId>,
  ) -> Result<String, ActionError> {
    if let Some(hash) = memo.get(&self.id) {
      return Ok(hash.clone());
    }
    if !in_progress.insert(self.id) {
      return Err(ActionError::Cycle {
        action: self.to_string(),
      });
    }

    let mut dependency_hashes = Vec::new();
    for dependency in self.dependencies_for_hash().iter() {
      dependency_hashes.push(dependency.recursive_hash_with(memo, in_progress)?);
    }
    dependency_hashes.sort();

    let mut fields = vec![
      self.name.clone(),
      self.target_name(),
      self.script().into_owned(),
      self.remote_head().unwrap_or_default(),
    ];
    fields.extend(dependency_hashes);
    let hash = hash_fields(&fields).0;

    in_progress.remove(&self.id);
    memo.insert(self.id, hash.clone());
    Ok(hash)
  }

  /// Run the action. In pretend mode only the intent is logged.
  pub fn run(&self, options: &RunOptions) -> Result<(), ActionError> {
    info!(action = %self, pretend = options.pretend, "Executing {self}");
    if options.pretend {
      return Ok(());
    }

    self.run_user_script(&self.script(), None)?;

    if let ActionKind::Install { build, .. } = &self.kind {
      let metadata = InstallMetadata {
        component_name: build.component.clone(),
        build_name: build.name.clone(),
        source: "build".to_string(),
        recursive_hash: self.recursive_hash()?,
        manually_installed: options.explicitly_requested,
      };
      write_install_metadata(&self.config.installed_component_path(&build.component), &metadata)?;
    }

    Ok(())
  }

  pub fn run_user_script(&self, script: &str, cwd: Option<&Path>) -> Result<(), ScriptError> {
    script::run_user_script(script, Some(&self.environment()), cwd)
  }

  pub fn run_internal_script(&self, script: &str, cwd: Option<&Path>) -> Result<(), ScriptError> {
    script::run_internal_script(script, Some(&self.environment()), cwd)
  }

  pub fn try_run_internal_script(&self, script: &str, cwd: Option<&Path>) -> Result<i32, ScriptError> {
    script::try_run_internal_script(script, Some(&self.environment()), cwd)
  }

  pub fn get_script_output(&self, script: &str, cwd: Option<&Path>) -> Result<String, ScriptError> {
    script::get_script_output(script, Some(&self.environment()), Encoding::Utf8, cwd)
  }

  pub fn try_get_script_output(&self, script: &str, cwd: Option<&Path>) -> Result<(i32, String), ScriptError> {
    script::try_get_script_output(script, Some(&self.environment()), Encoding::Utf8, cwd)
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Action {} of {}", self.name, self.target_name())
  }
}

impl fmt::Debug for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Action")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("target", &self.target_name())
      .finish()
  }
}

impl PartialEq for Action {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Action {}

impl Hash for Action {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}
