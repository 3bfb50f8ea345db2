use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::Action;
use crate::script::ScriptError;

/// Shared handle to an action. Actions are compared by identity.
pub type ActionRef = Arc<Action>;

/// Process-unique identity of an action.
///
/// Two actions never share an id, even if they have the same name and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(u64);

impl ActionId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    ActionId(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Display for ActionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A set of actions keyed by identity.
///
/// Iteration follows creation order of the actions, so traversals over a set
/// are deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencySet {
  actions: BTreeMap<ActionId, ActionRef>,
}

impl DependencySet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns false if the action was already present.
  pub fn insert(&mut self, action: ActionRef) -> bool {
    self.actions.insert(action.id(), action).is_none()
  }

  pub fn contains(&self, action: &Action) -> bool {
    self.actions.contains_key(&action.id())
  }

  pub fn len(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ActionRef> {
    self.actions.values()
  }

  pub fn ids(&self) -> impl Iterator<Item = ActionId> + '_ {
    self.actions.keys().copied()
  }

  pub fn union(&self, other: &DependencySet) -> DependencySet {
    let mut union = self.clone();
    union.extend(other.iter().cloned());
    union
  }
}

impl Extend<ActionRef> for DependencySet {
  fn extend<I: IntoIterator<Item = ActionRef>>(&mut self, iter: I) {
    for action in iter {
      self.insert(action);
    }
  }
}

impl FromIterator<ActionRef> for DependencySet {
  fn from_iter<I: IntoIterator<Item = ActionRef>>(iter: I) -> Self {
    let mut set = DependencySet::new();
    set.extend(iter);
    set
  }
}

impl PartialEq for DependencySet {
  fn eq(&self, other: &Self) -> bool {
    self.ids().eq(other.ids())
  }
}

impl Eq for DependencySet {}

/// Options for [`Action::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
  /// Log what would run without executing anything.
  pub pretend: bool,
  /// The user asked for this action by name, as opposed to it being pulled in
  /// as a dependency.
  pub explicitly_requested: bool,
}

impl RunOptions {
  pub fn pretend() -> Self {
    Self {
      pretend: true,
      ..Self::default()
    }
  }
}

/// Errors that can occur while evaluating or running actions.
#[derive(Debug, Error)]
pub enum ActionError {
  /// The action variant does not support the operation.
  #[error("{operation} is not implemented for {action}")]
  Unimplemented { action: String, operation: &'static str },

  #[error(transparent)]
  Script(#[from] ScriptError),

  /// The dependency graph loops back to an action still being evaluated.
  #[error("dependency cycle detected at {action}")]
  Cycle { action: String },

  #[error("failed to write {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize install metadata: {0}")]
  Metadata(#[from] serde_json::Error),
}
