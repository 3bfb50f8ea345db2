//! Orchestra configuration.
//!
//! A [`Configuration`] is the read-only handle every action is constructed
//! with. It is resolved once, from a JSON document or a
//! [`ConfigurationBuilder`], and never mutated afterwards.
//!
//! # Global environment
//!
//! [`Configuration::global_env`] composes, in order: the orchestra directory
//! variables, `GIT_ASKPASS`, `RPATH_PLACEHOLDER`, then the user declarations.
//! Later entries may reference earlier ones.

mod dependency;
mod types;

pub use dependency::*;
pub use types::*;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  APP_NAME, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILENAME, REMOTE_HEADS_CACHE_FILENAME, RPATH_PLACEHOLDER_PADDING,
  TMP_ROOTS_VAR,
};
use crate::environment::Environment;

/// Errors raised while loading or resolving a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read configuration {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("no configuration found (tried {})", display_paths(.0))]
  NotFound(Vec<PathBuf>),

  #[error("invalid dependency specified: {0}")]
  InvalidDependency(String),

  #[error("component {0} not found")]
  UnknownComponent(String),

  #[error("component {component} has no build named {build}")]
  UnknownBuild { component: String, build: String },

  #[error("component {0} declares no builds")]
  NoBuilds(String),

  #[error("{0} is required by orchestra and cannot be unset")]
  ReservedVariable(String),
}

/// A named build variant of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
  pub name: String,
  pub component: String,
  pub configure: String,
  pub install: String,
  pub dependencies: Vec<String>,
  pub build_dependencies: Vec<String>,
}

impl Build {
  /// `component@build`.
  pub fn qualified_name(&self) -> String {
    format!("{}@{}", self.component, self.name)
  }

  /// Qualified name usable as a single path component.
  pub fn safe_name(&self) -> String {
    self.qualified_name().replace(['@', '/'], "_")
  }
}

/// A source module owning one or more builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  pub name: String,
  pub repository: Option<String>,
  builds: IndexMap<String, Build>,
  default_build: String,
}

impl Component {
  /// Builds in declaration order.
  pub fn builds(&self) -> impl Iterator<Item = &Build> {
    self.builds.values()
  }

  pub fn build(&self, name: &str) -> Option<&Build> {
    self.builds.get(name)
  }

  pub fn default_build(&self) -> &Build {
    // Resolution guarantees the default build exists.
    &self.builds[&self.default_build]
  }

  pub fn default_build_name(&self) -> &str {
    &self.default_build
  }

  pub fn is_cloneable(&self) -> bool {
    self.repository.is_some()
  }
}

/// Resolved, read-only orchestra configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
  pub orchestra_root: PathBuf,
  pub orchestra_dotdir: PathBuf,
  pub sources_dir: PathBuf,
  pub builds_dir: PathBuf,
  pub tmproot: PathBuf,
  pub source_archives: PathBuf,
  pub binary_archives: PathBuf,
  remotes: IndexMap<String, String>,
  user_environment: Environment,
  components: IndexMap<String, Component>,
}

impl Configuration {
  pub fn builder() -> ConfigurationBuilder {
    ConfigurationBuilder::default()
  }

  /// Load a configuration document. Relative paths are resolved against the
  /// directory containing `path`.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let base_dir = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));
    let base_dir = dunce::canonicalize(&base_dir).unwrap_or(base_dir);

    debug!(path = %path.display(), "loading configuration");
    Self::from_json(&text, &base_dir)
  }

  pub fn from_json(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
    let document: ConfigDocument = serde_json::from_str(text)?;
    Self::from_document(document, base_dir)
  }

  pub fn from_document(document: ConfigDocument, base_dir: &Path) -> Result<Self, ConfigError> {
    let paths = &document.paths;
    let resolve = |path: &Option<PathBuf>, default: PathBuf| match path {
      Some(path) if path.is_absolute() => path.clone(),
      Some(path) => base_dir.join(path),
      None => default,
    };

    let orchestra_root = resolve(&paths.orchestra_root, base_dir.join("root"));
    let orchestra_dotdir = resolve(&paths.orchestra_dotdir, base_dir.join(".orchestra"));
    let sources_dir = resolve(&paths.sources_dir, base_dir.join("sources"));
    let builds_dir = resolve(&paths.builds_dir, base_dir.join("build"));
    let tmproot = resolve(&paths.tmproot, orchestra_dotdir.join("tmproot"));
    let source_archives = resolve(&paths.source_archives, orchestra_dotdir.join("source_archives"));
    let binary_archives = resolve(&paths.binary_archives, orchestra_dotdir.join("binary_archives"));

    let mut user_environment = Environment::new();
    for decl in &document.environment {
      match &decl.value {
        Some(value) => user_environment.set(&decl.name, value),
        None if decl.name == TMP_ROOTS_VAR => return Err(ConfigError::ReservedVariable(decl.name.clone())),
        None => user_environment.unset(&decl.name),
      }
    }

    let mut components = IndexMap::new();
    for (name, component) in document.components {
      components.insert(name.clone(), resolve_component(name, component)?);
    }

    Ok(Self {
      orchestra_root,
      orchestra_dotdir,
      sources_dir,
      builds_dir,
      tmproot,
      source_archives,
      binary_archives,
      remotes: document.remotes,
      user_environment,
      components,
    })
  }

  /// Locate the configuration document: `explicit`, then `$ORCHESTRA_CONFIG`,
  /// then `orchestra.json` in the current directory.
  pub fn discover(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
      candidates.push(path.to_path_buf());
    } else {
      if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(path));
      }
      candidates.push(PathBuf::from(DEFAULT_CONFIG_FILENAME));
    }

    match candidates.iter().find(|p| p.is_file()) {
      Some(path) => Ok(path.clone()),
      None => Err(ConfigError::NotFound(candidates)),
    }
  }

  /// The environment shared by every action, rebuilt on each call.
  pub fn global_env(&self) -> Environment {
    let mut env = Environment::new();
    env.set("ORCHESTRA_DOTDIR", self.orchestra_dotdir.to_string_lossy());
    env.set("ORCHESTRA_ROOT", self.orchestra_root.to_string_lossy());
    env.set("SOURCE_ARCHIVES", self.source_archives.to_string_lossy());
    env.set("BINARY_ARCHIVES", self.binary_archives.to_string_lossy());
    env.set(TMP_ROOTS_VAR, self.tmproot.to_string_lossy());
    env.set("SOURCES_DIR", self.sources_dir.to_string_lossy());
    env.set("BUILDS_DIR", self.builds_dir.to_string_lossy());
    env.set("GIT_ASKPASS", "/bin/true");
    env.set(
      "RPATH_PLACEHOLDER",
      format!("{}$ORCHESTRA_ROOT", "/".repeat(RPATH_PLACEHOLDER_PADDING)),
    );
    env.extend(&self.user_environment);
    env
  }

  /// Mirror name to base URL, in priority order.
  pub fn remotes(&self) -> &IndexMap<String, String> {
    &self.remotes
  }

  /// Components in declaration order.
  pub fn components(&self) -> impl Iterator<Item = &Component> {
    self.components.values()
  }

  pub fn component(&self, name: &str) -> Option<&Component> {
    self.components.get(name)
  }

  /// Look up `component` (its default build) or `component@build`.
  pub fn get_build(&self, name: &str) -> Option<&Build> {
    match name.split_once('@') {
      Some((component, build)) => self.component(component)?.build(build),
      None => Some(self.component(name)?.default_build()),
    }
  }

  pub fn remote_heads_cache_path(&self) -> PathBuf {
    self.orchestra_dotdir.join(REMOTE_HEADS_CACHE_FILENAME)
  }

  /// Where an installed component records which build it came from.
  pub fn installed_component_path(&self, component: &str) -> PathBuf {
    self
      .orchestra_root
      .join("share")
      .join(APP_NAME)
      .join(format!("{component}.json"))
  }
}

fn display_paths(paths: &[PathBuf]) -> String {
  paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

fn resolve_component(name: String, document: ComponentDocument) -> Result<Component, ConfigError> {
  let default_build = match document.default_build {
    Some(build) if document.builds.contains_key(&build) => build,
    Some(build) => return Err(ConfigError::UnknownBuild { component: name, build }),
    None => match document.builds.keys().next() {
      Some(build) => build.clone(),
      None => return Err(ConfigError::NoBuilds(name)),
    },
  };

  let builds = document
    .builds
    .into_iter()
    .map(|(build_name, build)| {
      let build = Build {
        name: build_name.clone(),
        component: name.clone(),
        configure: build.configure,
        install: build.install,
        dependencies: build.dependencies,
        build_dependencies: build.build_dependencies,
      };
      (build_name, build)
    })
    .collect();

  Ok(Component {
    name,
    repository: document.repository,
    builds,
    default_build,
  })
}

/// Programmatic construction of a [`Configuration`].
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
  base_dir: Option<PathBuf>,
  document: ConfigDocument,
}

impl ConfigurationBuilder {
  /// Directory that default and relative paths are resolved against.
  pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
    self.base_dir = Some(base_dir.into());
    self
  }

  pub fn paths(mut self, paths: PathsDocument) -> Self {
    self.document.paths = paths;
    self
  }

  pub fn remote(mut self, name: impl Into<String>, base_url: impl Into<String>) -> Self {
    self.document.remotes.insert(name.into(), base_url.into());
    self
  }

  pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.document.environment.push(EnvDecl {
      name: name.into(),
      value: Some(value.into()),
    });
    self
  }

  pub fn unset_env(mut self, name: impl Into<String>) -> Self {
    self.document.environment.push(EnvDecl {
      name: name.into(),
      value: None,
    });
    self
  }

  pub fn component(mut self, name: impl Into<String>, component: ComponentDocument) -> Self {
    self.document.components.insert(name.into(), component);
    self
  }

  pub fn build(self) -> Result<Configuration, ConfigError> {
    let base_dir = self.base_dir.unwrap_or_else(|| PathBuf::from("."));
    Configuration::from_document(self.document, &base_dir)
  }
}
