//! Serialized form of an orchestra configuration document.
//!
//! These types mirror the JSON on disk. They carry no validation: resolving a
//! document into a [`Configuration`](super::Configuration) checks builds,
//! default builds and reserved variables.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level configuration document.
///
/// # Example
///
/// ```json
/// {
///   "paths": { "orchestra_root": "root" },
///   "remotes": { "origin": "https://git.example.com/orchestra" },
///   "environment": [
///     { "name": "CFLAGS", "value": "-O2" },
///     { "name": "LD_PRELOAD" }
///   ],
///   "components": {
///     "zlib": {
///       "repository": "zlib",
///       "builds": {
///         "default": { "configure": "./configure", "install": "make install" }
///       }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
  #[serde(default)]
  pub paths: PathsDocument,
  /// Mirror name to base URL, in priority order.
  #[serde(default)]
  pub remotes: IndexMap<String, String>,
  /// Variables appended to the global environment, in declaration order.
  #[serde(default)]
  pub environment: Vec<EnvDecl>,
  #[serde(default)]
  pub components: IndexMap<String, ComponentDocument>,
}

/// Directory overrides. Relative paths are resolved against the directory of
/// the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsDocument {
  pub orchestra_root: Option<PathBuf>,
  pub orchestra_dotdir: Option<PathBuf>,
  pub sources_dir: Option<PathBuf>,
  pub builds_dir: Option<PathBuf>,
  pub tmproot: Option<PathBuf>,
  pub source_archives: Option<PathBuf>,
  pub binary_archives: Option<PathBuf>,
}

/// A user environment declaration. A missing or `null` value unsets the variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvDecl {
  pub name: String,
  #[serde(default)]
  pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDocument {
  /// Repository name appended to each mirror's base URL. Components without
  /// one are not cloned.
  #[serde(default)]
  pub repository: Option<String>,
  /// Defaults to the first declared build.
  #[serde(default)]
  pub default_build: Option<String>,
  pub builds: IndexMap<String, BuildDocument>,
}

impl ComponentDocument {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn repository(mut self, repository: impl Into<String>) -> Self {
    self.repository = Some(repository.into());
    self
  }

  pub fn default_build(mut self, build: impl Into<String>) -> Self {
    self.default_build = Some(build.into());
    self
  }

  pub fn build(mut self, name: impl Into<String>, build: BuildDocument) -> Self {
    self.builds.insert(name.into(), build);
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDocument {
  pub configure: String,
  pub install: String,
  /// Needed to configure and at install time.
  #[serde(default)]
  pub dependencies: Vec<String>,
  /// Needed to configure only.
  #[serde(default)]
  pub build_dependencies: Vec<String>,
}

impl BuildDocument {
  pub fn new(configure: impl Into<String>, install: impl Into<String>) -> Self {
    Self {
      configure: configure.into(),
      install: install.into(),
      ..Self::default()
    }
  }

  pub fn dependency(mut self, dependency: impl Into<String>) -> Self {
    self.dependencies.push(dependency.into());
    self
  }

  pub fn build_dependency(mut self, dependency: impl Into<String>) -> Self {
    self.build_dependencies.push(dependency.into());
    self
  }
}
