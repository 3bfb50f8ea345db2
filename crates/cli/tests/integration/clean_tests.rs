//! `orchestra clean` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn pretend_keeps_build_dir() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");
  env.write_file("build/toolchain/default/installed", "-O2\n");

  env
    .orchestra_cmd()
    .args(["clean", "--pretend", "toolchain"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Would remove"));

  assert!(env.path("build/toolchain/default/installed").is_file());
}

#[test]
fn removes_build_dir() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");
  env.write_file("build/libfoo/debug/object.o", "");
  env.create_dir("build/libfoo/release");

  env
    .orchestra_cmd()
    .args(["clean", "libfoo@debug"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));

  assert!(!env.path("build/libfoo/debug").exists());
  assert!(env.path("build/libfoo/release").is_dir());
}

#[test]
fn missing_build_dir_is_not_an_error() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  env.orchestra_cmd().args(["clean", "toolchain"]).assert().success();
}

#[test]
fn unknown_component_fails() {
  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["clean", "missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Unknown component or build missing"));
}
