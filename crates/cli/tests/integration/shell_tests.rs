//! `orchestra shell` integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, ends_with};

#[test]
fn runs_command_in_global_environment() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["shell", "printenv", "PROJECT_FLAGS"])
    .assert()
    .success()
    .stdout("-O2\n");

  env
    .orchestra_cmd()
    .args(["shell", "printenv", "GIT_ASKPASS"])
    .assert()
    .success()
    .stdout("/bin/true\n");
}

#[test]
fn arguments_are_passed_verbatim() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["shell", "printf", "%s|", "a b", "$HOME", "-c"])
    .assert()
    .success()
    .stdout("a b|$HOME|-c|");
}

#[test]
fn component_shell_requires_build_dir() {
  let env = TestEnv::from_fixture("project.json");

  env
    .orchestra_cmd()
    .args(["shell", "-c", "toolchain", "true"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("does not exist, configure toolchain first"));
}

#[test]
fn component_shell_starts_in_build_dir() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");
  env.create_dir("build/toolchain/default");

  let output = env.orchestra_cmd().args(["shell", "-c", "toolchain", "pwd"]).output().unwrap();
  assert!(output.status.success());
  assert!(ends_with(&String::from_utf8_lossy(&output.stdout), "build/toolchain/default"));

  let output = env
    .orchestra_cmd()
    .args(["shell", "-c", "toolchain", "printenv", "TMP_ROOT"])
    .output()
    .unwrap();
  assert!(output.status.success());
  assert!(ends_with(&String::from_utf8_lossy(&output.stdout), ".orchestra/tmproot/toolchain_default"));
}

#[test]
fn exit_code_of_command_is_kept() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  env.orchestra_cmd().args(["shell", "sh", "-c", "exit 3"]).assert().code(3);
}

#[test]
fn shell_builtins_run_as_commands() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  env.orchestra_cmd().args(["shell", "exit", "1"]).assert().code(1);
  env.orchestra_cmd().args(["shell", "cd", "/"]).assert().success();
}

/// Login shell of the user running the tests, when it reads commands from stdin.
fn login_shell_reads_stdin() -> bool {
  let Ok(output) = std::process::Command::new("sh")
    .args(["-c", "getent passwd \"$(id -un)\" | cut -d: -f7"])
    .output()
  else {
    return false;
  };
  let shell = String::from_utf8_lossy(&output.stdout).trim().to_string();
  output.status.success() && shell.ends_with("sh") && std::path::Path::new(&shell).is_file()
}

#[test]
fn interactive_shell_sets_prompt_and_home() {
  if cfg!(windows) || !login_shell_reads_stdin() {
    return;
  }

  let env = TestEnv::from_fixture("project.json");

  let output = env
    .orchestra_cmd()
    .arg("shell")
    .write_stdin("printenv PS1_PREFIX; printenv HOME; printenv PROJECT_FLAGS\n")
    .output()
    .unwrap();
  assert!(output.status.success());

  let stdout = String::from_utf8_lossy(&output.stdout);
  let lines: Vec<&str> = stdout.lines().collect();
  assert_eq!(lines[0], "(orchestra) ");
  assert!(ends_with(lines[1], ".orchestra/shell-home"));
  assert_eq!(lines[2], "-O2");
  assert!(env.path(".orchestra/shell-home/.bashrc").is_file());
}

#[test]
fn component_prompt_names_the_build() {
  if cfg!(windows) || !login_shell_reads_stdin() {
    return;
  }

  let env = TestEnv::from_fixture("project.json");
  env.create_dir("build/toolchain/default");

  env
    .orchestra_cmd()
    .args(["shell", "-c", "toolchain"])
    .write_stdin("printenv PS1_PREFIX\n")
    .assert()
    .success()
    .stdout("(orchestra - toolchain@default) \n");
}
