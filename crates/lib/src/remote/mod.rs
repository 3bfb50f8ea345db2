//! Remote branch listing.
//!
//! Remotes are queried with `git ls-remote`, whose output lists one
//! `<commit> refs/heads/<branch>` pair per line. [`RefLister`] abstracts the
//! query so that clone actions and the [`RemoteHeadsCache`] can be driven by
//! a fake in tests.

mod cache;

pub use cache::*;

use std::fmt;

use tracing::{debug, warn};

use crate::consts::PREFERRED_BRANCHES;
use crate::environment::Environment;
use crate::script::{Encoding, try_get_script_output};

/// Lists the branch heads of a remote repository.
pub trait RefLister: Send + Sync + fmt::Debug {
  /// Raw listing output for `remote`.
  ///
  /// Must not fail: an unreachable remote yields an empty listing.
  fn list_heads(&self, remote: &str, environment: &Environment) -> String;
}

/// Queries remotes with `git ls-remote -h --refs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLsRemote;

impl RefLister for GitLsRemote {
  fn list_heads(&self, remote: &str, environment: &Environment) -> String {
    let script = format!("git ls-remote -h --refs \"{remote}\"");
    match try_get_script_output(&script, Some(environment), Encoding::Utf8, None) {
      Ok((0, output)) => output,
      Ok((exit_code, _)) => {
        debug!(remote, exit_code, "git ls-remote failed");
        String::new()
      }
      Err(err) => {
        warn!(remote, error = %err, "could not list remote heads");
        String::new()
      }
    }
  }
}

/// URL of `repository` on the mirror at `base_url`.
pub fn remote_url(base_url: &str, repository: &str) -> String {
  format!("{base_url}/{repository}")
}

/// Parse `ls-remote` output into `(branch, commit)` pairs, in listing order.
///
/// Lines that are not `<hex commit> refs/heads/<branch>` are skipped.
pub fn parse_heads(listing: &str) -> Vec<(String, String)> {
  listing
    .lines()
    .filter_map(|line| {
      let mut fields = line.split_whitespace();
      let commit = fields.next()?;
      let branch = fields.next()?.strip_prefix("refs/heads/")?;
      if fields.next().is_some() || branch.is_empty() || !commit.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
      }
      Some((branch.to_string(), commit.to_string()))
    })
    .collect()
}

/// Commit of the first listed branch that is one of [`PREFERRED_BRANCHES`].
pub fn preferred_head(listing: &str) -> Option<String> {
  parse_heads(listing)
    .into_iter()
    .find(|(branch, _)| PREFERRED_BRANCHES.contains(&branch.as_str()))
    .map(|(_, commit)| commit)
}
