//! Test utilities for orchestra-lib.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::{BuildDocument, ComponentDocument, Configuration, ConfigurationBuilder};
use crate::environment::Environment;
use crate::remote::RefLister;

/// A [`RefLister`] answering from a fixed table and recording every query.
#[derive(Debug, Default)]
pub struct FakeLister {
  responses: HashMap<String, String>,
  calls: Mutex<Vec<String>>,
}

impl FakeLister {
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer `listing` when `remote` is queried. Unknown remotes answer nothing.
  pub fn respond(mut self, remote: impl Into<String>, listing: impl Into<String>) -> Self {
    self.responses.insert(remote.into(), listing.into());
    self
  }

  pub fn shared(self) -> Arc<Self> {
    Arc::new(self)
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }
}

impl RefLister for FakeLister {
  fn list_heads(&self, remote: &str, _environment: &Environment) -> String {
    self.calls.lock().unwrap().push(remote.to_string());
    self.responses.get(remote).cloned().unwrap_or_default()
  }
}

/// A configuration rooted at `base` with two mirrors and a small component set:
///
/// - `zlib` (cloneable, builds `default` and `debug`)
/// - `libpng` (cloneable, depends on `zlib`, build-depends on `cmake`)
/// - `cmake` (not cloneable)
pub fn sample_config(base: &Path) -> ConfigurationBuilder {
  Configuration::builder()
    .base_dir(base)
    .remote("primary", "https://primary.example.com")
    .remote("fallback", "https://fallback.example.com")
    .component(
      "zlib",
      ComponentDocument::new()
        .repository("zlib")
        .build("default", BuildDocument::new("echo configure zlib", "echo install zlib"))
        .build("debug", BuildDocument::new("echo configure zlib debug", "echo install zlib debug")),
    )
    .component(
      "libpng",
      ComponentDocument::new().repository("libpng").build(
        "default",
        BuildDocument::new("echo configure libpng", "echo install libpng")
          .dependency("zlib")
          .build_dependency("cmake"),
      ),
    )
    .component(
      "cmake",
      ComponentDocument::new().build("default", BuildDocument::new("echo configure cmake", "echo install cmake")),
    )
}
