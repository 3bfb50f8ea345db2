//! Implementation of the `orchestra update` command.
//!
//! Lists the branches of every cloneable component on the configured mirrors
//! and writes the result to the remote HEADs cache.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use orchestra_lib::remote::{GitLsRemote, RemoteHeadsCache};

use super::load_config;
use crate::output::{format_duration, print_stat, print_success, print_warning};

pub fn cmd_update(config: Option<&Path>, parallelism: usize) -> Result<()> {
  let start = Instant::now();
  let configuration = Arc::new(load_config(config)?);

  let mut cache =
    RemoteHeadsCache::load(configuration, Arc::new(GitLsRemote)).context("Failed to load the remote HEADs cache")?;

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .context("Failed to start the async runtime")?;
  let failed = runtime
    .block_on(cache.rebuild(parallelism))
    .context("Failed to rebuild the remote HEADs cache")?;

  for repository in &failed {
    print_warning(&format!("No mirror answered for {repository}"));
  }

  print_success(&format!("Remote HEADs cache written to {}", cache.path().display()));
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
