//! Persisted cache of remote branch heads.
//!
//! The cache maps component names to the `branch -> commit` listing of the
//! first mirror that answered for the component's repository. It lives in
//! `<orchestra_dotdir>/remote_refs_cache.json` and is rebuilt by
//! `orchestra update`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{RefLister, parse_heads, remote_url};
use crate::config::Configuration;

/// Branch name to commit.
pub type Heads = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum RemoteCacheError {
  #[error("IO error while reading remote HEADs cache {path}: {source}. Try running `orchestra update`")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("error while parsing remote HEADs cache {path}: {source}. Try removing it and running `orchestra update`")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write remote HEADs cache {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize remote HEADs cache: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("remote listing task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("remote listing pool closed: {0}")]
  Closed(#[from] tokio::sync::AcquireError),
}

#[derive(Debug)]
pub struct RemoteHeadsCache {
  config: Arc<Configuration>,
  lister: Arc<dyn RefLister>,
  path: PathBuf,
  heads: BTreeMap<String, Heads>,
}

impl RemoteHeadsCache {
  /// Load the cache from the configuration's dot directory.
  ///
  /// A missing file is not an error: the cache starts empty.
  pub fn load(config: Arc<Configuration>, lister: Arc<dyn RefLister>) -> Result<Self, RemoteCacheError> {
    let path = config.remote_heads_cache_path();
    let heads = read_cache(&path)?;
    Ok(Self {
      config,
      lister,
      path,
      heads,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Cached heads for `component`, if any mirror answered for it.
  pub fn heads(&self, component: &str) -> Option<&Heads> {
    self.heads.get(component)
  }

  /// Re-list every cloneable component, querying at most `parallelism`
  /// repositories at a time.
  ///
  /// Mirrors are tried in priority order and the first non-empty listing
  /// wins. Returns the repositories no mirror answered for. The cache is
  /// persisted even if some repositories failed.
  pub async fn rebuild(&mut self, parallelism: usize) -> Result<BTreeSet<String>, RemoteCacheError> {
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let environment = Arc::new(self.config.global_env());
    let mirrors: Vec<String> = self.config.remotes().values().cloned().collect();

    let mut join_set = JoinSet::new();
    for component in self.config.components() {
      let Some(repository) = component.repository.clone() else {
        continue;
      };
      let name = component.name.clone();
      let remotes: Vec<String> = mirrors.iter().map(|base| remote_url(base, &repository)).collect();
      let lister = Arc::clone(&self.lister);
      let environment = Arc::clone(&environment);
      let semaphore = Arc::clone(&semaphore);

      join_set.spawn(async move {
        let _permit = semaphore.acquire_owned().await?;
        let heads = tokio::task::spawn_blocking(move || {
          debug!(component = %name, "Fetching the latest remote commit");
          let heads = remotes.iter().find_map(|remote| {
            let heads: Heads = parse_heads(&lister.list_heads(remote, &environment)).into_iter().collect();
            (!heads.is_empty()).then_some(heads)
          });
          (name, repository, heads)
        })
        .await?;
        Ok::<_, RemoteCacheError>(heads)
      });
    }

    let mut heads = BTreeMap::new();
    let mut failed_repositories = BTreeSet::new();
    while let Some(result) = join_set.join_next().await {
      match result?? {
        (name, _, Some(component_heads)) => {
          heads.insert(name, component_heads);
        }
        (name, repository, None) => {
          warn!(component = %name, repository = %repository, "no mirror answered");
          failed_repositories.insert(repository);
        }
      }
    }

    info!(components = heads.len(), failed = failed_repositories.len(), "remote HEADs cache rebuilt");
    self.heads = heads;
    self.persist()?;
    Ok(failed_repositories)
  }

  /// Record `commit` as the head of `branch` for `component` and persist.
  pub fn set_entry(&mut self, component: &str, branch: &str, commit: &str) -> Result<(), RemoteCacheError> {
    self
      .heads
      .entry(component.to_string())
      .or_default()
      .insert(branch.to_string(), commit.to_string());
    self.persist()
  }

  fn persist(&self) -> Result<(), RemoteCacheError> {
    let json = serde_json::to_string_pretty(&self.heads).map_err(RemoteCacheError::Serialize)?;

    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).map_err(|source| RemoteCacheError::Write {
        path: self.path.clone(),
        source,
      })?;
    }

    fs::write(&self.path, json).map_err(|source| RemoteCacheError::Write {
      path: self.path.clone(),
      source,
    })
  }
}

fn read_cache(path: &Path) -> Result<BTreeMap<String, Heads>, RemoteCacheError> {
  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(err) if err.kind() == io::ErrorKind::NotFound => {
      warn!(path = %path.display(), "The remote HEADs cache does not exist, you should run `orchestra update`");
      return Ok(BTreeMap::new());
    }
    Err(source) => {
      return Err(RemoteCacheError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  serde_json::from_str(&text).map_err(|source| RemoteCacheError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
