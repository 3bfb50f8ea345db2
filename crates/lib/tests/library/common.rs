//! Shared helpers for library integration tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use orchestra_lib::config::Configuration;
use orchestra_lib::environment::Environment;
use orchestra_lib::remote::RefLister;

/// Two mirrors and a three component chain: `app` depends on `libfoo`, which
/// build-depends on `toolchain`.
pub const PROJECT_CONFIG: &str = r#"{
  "remotes": {
    "primary": "https://primary.example.com",
    "fallback": "https://fallback.example.com"
  },
  "environment": [
    { "name": "PROJECT_FLAGS", "value": "-O2" }
  ],
  "components": {
    "toolchain": {
      "builds": {
        "default": {
          "configure": "mkdir -p \"$BUILD_DIR\"",
          "install": "echo \"$PROJECT_FLAGS\" > \"$BUILD_DIR/installed\""
        }
      }
    },
    "libfoo": {
      "repository": "libfoo",
      "builds": {
        "release": {
          "configure": "mkdir -p \"$BUILD_DIR\"",
          "install": "touch \"$BUILD_DIR/installed\"",
          "build_dependencies": ["toolchain"]
        },
        "debug": {
          "configure": "mkdir -p \"$BUILD_DIR\"",
          "install": "touch \"$BUILD_DIR/installed\""
        }
      }
    },
    "app": {
      "repository": "apps/app",
      "builds": {
        "default": {
          "configure": "mkdir -p \"$BUILD_DIR\"",
          "install": "touch \"$BUILD_DIR/installed\"",
          "dependencies": ["libfoo@release"]
        }
      }
    }
  }
}"#;

/// Write `content` as `orchestra.json` under `dir` and load it.
pub fn load_config(dir: &Path, content: &str) -> Arc<Configuration> {
  let path = dir.join("orchestra.json");
  std::fs::write(&path, content).unwrap();
  Arc::new(Configuration::from_file(&path).unwrap())
}

/// A [`RefLister`] answering from a fixed table, counting queries.
#[derive(Debug, Default)]
pub struct CountingLister {
  responses: HashMap<String, String>,
  calls: AtomicUsize,
}

impl CountingLister {
  pub fn new(responses: &[(&str, &str)]) -> Arc<Self> {
    Arc::new(Self {
      responses: responses.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
      calls: AtomicUsize::new(0),
    })
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl RefLister for CountingLister {
  fn list_heads(&self, remote: &str, _environment: &Environment) -> String {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.responses.get(remote).cloned().unwrap_or_default()
  }
}
