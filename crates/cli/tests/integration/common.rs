//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the configuration and
/// every path it declares.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Copies the fixture content to a temporary `orchestra.json`.
  pub fn from_fixture(name: &str) -> Self {
    Self::from_content(&fixture_content(name))
  }

  pub fn from_content(content: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("orchestra.json");
    std::fs::write(&config_path, content).unwrap();
    Self { temp, config_path }
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn create_dir(&self, relative_path: &str) -> PathBuf {
    let path = self.path(relative_path);
    std::fs::create_dir_all(&path).unwrap();
    path
  }

  /// Record `build` of `component` as installed.
  pub fn mark_installed(&self, component: &str, build: &str) {
    self.write_file(
      &format!("root/share/orchestra/{component}.json"),
      &format!(
        r#"{{ "component_name": "{component}", "build_name": "{build}", "source": "build",
            "recursive_hash": "0000", "manually_installed": true }}"#
      ),
    );
  }

  /// A Command for the orchestra binary, pointed at this environment's
  /// configuration and run from outside it.
  pub fn orchestra_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("orchestra");
    cmd.env_remove("ORCHESTRA_LOG");
    cmd.env_remove("RUST_LOG");
    cmd.env("ORCHESTRA_CONFIG", &self.config_path);
    cmd.current_dir(std::env::temp_dir());
    cmd
  }
}

/// Whether `path` ends with the components of `suffix`.
pub fn ends_with(path: &str, suffix: &str) -> bool {
  Path::new(path.trim()).ends_with(suffix)
}
