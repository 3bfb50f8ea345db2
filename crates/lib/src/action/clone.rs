//! Cloning component sources from the configured mirrors.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::Configuration;
use crate::consts::{PREFERRED_BRANCHES, TEMPORARY_BRANCH};
use crate::environment::Environment;
use crate::remote::{RefLister, preferred_head, remote_url};
use crate::util::memo::SingleFlight;

const OR_CHAIN: &str = " || \\\n  ";

/// State of a clone action: the repository to fetch and the remote lookups
/// made so far.
///
/// Lookups are memoized for the lifetime of the action: remote state is
/// assumed not to change during one orchestra run.
#[derive(Debug)]
pub struct CloneAction {
  pub(crate) component: String,
  repository: String,
  lister: Arc<dyn RefLister>,
  remote_heads: SingleFlight<String, Option<String>>,
  listings: SingleFlight<(String, String), String>,
}

impl CloneAction {
  pub(crate) fn new(component: String, repository: String, lister: Arc<dyn RefLister>) -> Self {
    Self {
      component,
      repository,
      lister,
      remote_heads: SingleFlight::new(),
      listings: SingleFlight::new(),
    }
  }

  pub fn component(&self) -> &str {
    &self.component
  }

  pub fn repository(&self) -> &str {
    &self.repository
  }

  /// The clone script.
  ///
  /// Mirrors are tried in priority order until one clone succeeds. The branch
  /// created by the clone is renamed out of the way, then the first preferred
  /// branch that exists upstream is checked out. If none exists the script
  /// still succeeds, leaving the sources on the renamed branch.
  pub fn script(&self, config: &Configuration) -> String {
    let clone_cmds: Vec<String> = config
      .remotes()
      .values()
      .map(|base_url| format!("git clone \"{}\" \"$SOURCE_DIR\"", remote_url(base_url, &self.repository)))
      .collect();

    let mut checkout_cmds: Vec<String> = PREFERRED_BRANCHES
      .iter()
      .map(|branch| format!("git -C \"$SOURCE_DIR\" checkout -b \"{branch}\" \"origin/{branch}\""))
      .collect();
    checkout_cmds.push("true".to_string());

    let mut script = clone_cmds.join(OR_CHAIN);
    script.push('\n');
    script.push_str(&format!("git -C \"$SOURCE_DIR\" branch -m {TEMPORARY_BRANCH}\n"));
    script.push_str(&checkout_cmds.join(OR_CHAIN));
    script
  }

  /// Commit of the first preferred branch found on any candidate remote.
  ///
  /// Candidates are the mirrors in priority order, preceded by the local
  /// clone in `source_dir` if there is one. A remote that cannot be listed
  /// counts as having no match.
  pub fn get_remote_head(
    &self,
    config: &Configuration,
    source_dir: &Path,
    environment: &Environment,
  ) -> Option<String> {
    self.remote_heads.get_or_compute(&self.repository, || {
      let mut remotes: Vec<String> = config
        .remotes()
        .values()
        .map(|base_url| remote_url(base_url, &self.repository))
        .collect();

      let local_repo = source_dir.join(".git");
      if local_repo.exists() {
        remotes.insert(0, local_repo.to_string_lossy().into_owned());
      }

      let head = remotes
        .iter()
        .find_map(|remote| preferred_head(&self.ls_remote(remote, environment)));
      debug!(repository = %self.repository, head = ?head, "resolved remote head");
      head
    })
  }

  fn ls_remote(&self, remote: &str, environment: &Environment) -> String {
    let key = (self.repository.clone(), remote.to_string());
    self
      .listings
      .get_or_compute(&key, || self.lister.list_heads(remote, environment))
  }

  /// Drop memoized lookups, for callers that outlive a single run.
  pub fn clear_cache(&self) {
    self.remote_heads.clear();
    self.listings.clear();
  }
}
