//! `orchestra components` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn lists_components_and_builds() {
  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .arg("components")
    .assert()
    .success()
    .stdout(predicate::str::contains("toolchain\n  • default (default)\n"))
    .stdout(predicate::str::contains(
      "libfoo (not cloned)\n  • release (default)\n  • debug\n",
    ));
}

#[test]
fn installed_builds_are_marked() {
  let env = TestEnv::from_fixture("project.json");
  env.mark_installed("libfoo", "debug");
  env.create_dir("sources/libfoo");

  env
    .orchestra_cmd()
    .arg("components")
    .assert()
    .success()
    .stdout(predicate::str::contains(
      "libfoo (cloned)\n  • release (default)\n  ✓ debug\n",
    ));
}

#[test]
fn json_output() {
  let env = TestEnv::from_fixture("project.json");
  env.mark_installed("toolchain", "default");

  let output = env.orchestra_cmd().args(["components", "--output", "json"]).output().unwrap();
  assert!(output.status.success());

  let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let entries = entries.as_array().unwrap();
  assert_eq!(entries.len(), 3);

  assert_eq!(entries[0]["component"], "toolchain");
  assert_eq!(entries[0]["installed"], true);
  assert!(entries[0]["cloned"].is_null());

  assert_eq!(entries[1]["build"], "release");
  assert_eq!(entries[1]["default"], true);
  assert_eq!(entries[1]["cloned"], false);
  assert_eq!(entries[2]["default"], false);
}

#[test]
fn verbose_shows_cached_heads() {
  let env = TestEnv::from_fixture("project.json");
  env.write_file(
    ".orchestra/remote_refs_cache.json",
    r#"{ "libfoo": { "master": "0123456789abcdef0123456789abcdef01234567" } }"#,
  );

  env
    .orchestra_cmd()
    .args(["components", "--verbose"])
    .assert()
    .success()
    .stdout(predicate::str::contains("→ master 0123456789ab\n"));
}
