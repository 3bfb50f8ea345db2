//! `orchestra clone` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn pretend_clones_nothing() {
  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["clone", "libfoo", "--pretend"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Would clone libfoo"));

  assert!(!env.path("sources/libfoo").exists());
}

#[test]
fn existing_clone_is_kept() {
  let env = TestEnv::from_fixture("project.json");
  env.create_dir("sources/libfoo");

  env
    .orchestra_cmd()
    .args(["clone", "libfoo"])
    .assert()
    .success()
    .stdout(predicate::str::contains("libfoo is already cloned"));
}

#[test]
fn components_without_repository_cannot_be_cloned() {
  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["clone", "toolchain"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Component toolchain has no repository to clone"));

  env
    .orchestra_cmd()
    .args(["clone", "missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Unknown component missing"));
}

#[test]
fn unreachable_mirrors_fail_the_clone() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["--quiet", "clone", "libfoo"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to clone libfoo"));
}
