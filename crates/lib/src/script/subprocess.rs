//! Argv-based process execution for internal programs.
//!
//! No shell is involved: the environment is applied to the child process
//! directly, on top of the inherited one, and unset entries are removed.

use std::path::Path;
use std::process::Command;

use tracing::{Level, debug, error};

use super::log_at;
use super::types::{Encoding, ScriptError, ScriptOutput, StderrMode, StdoutMode};
use crate::environment::Environment;

/// Run an internal program, failing with [`ScriptError::InternalSubprocess`] on a nonzero exit.
pub fn run_internal_subprocess(
  argv: &[&str],
  environment: Option<&Environment>,
  cwd: Option<&Path>,
) -> Result<(), ScriptError> {
  internal_subprocess(argv, environment, cwd, true).map(|_| ())
}

/// Run an internal program that is allowed to fail and return its exit code.
pub fn try_run_internal_subprocess(
  argv: &[&str],
  environment: Option<&Environment>,
  cwd: Option<&Path>,
) -> Result<i32, ScriptError> {
  internal_subprocess(argv, environment, cwd, false)
}

fn internal_subprocess(
  argv: &[&str],
  environment: Option<&Environment>,
  cwd: Option<&Path>,
  check_exit_code: bool,
) -> Result<i32, ScriptError> {
  let output = run_subprocess(
    argv,
    environment,
    cwd,
    Level::DEBUG,
    StdoutMode::Capture,
    StderrMode::ToStdout,
  )?;

  if check_exit_code && !output.success() {
    return Err(subprocess_failure(argv, &output));
  }

  debug!("The subprocess output was:\n{}", output.combined_lossy());
  Ok(output.exit_code)
}

/// Run an internal program and return its decoded stdout.
pub fn get_subprocess_output(
  argv: &[&str],
  environment: Option<&Environment>,
  encoding: Encoding,
  cwd: Option<&Path>,
) -> Result<String, ScriptError> {
  subprocess_output(argv, environment, encoding, cwd, true).map(|(_, output)| output)
}

/// Run an internal program that is allowed to fail; returns `(exit_code, stdout)`.
pub fn try_get_subprocess_output(
  argv: &[&str],
  environment: Option<&Environment>,
  encoding: Encoding,
  cwd: Option<&Path>,
) -> Result<(i32, String), ScriptError> {
  subprocess_output(argv, environment, encoding, cwd, false)
}

fn subprocess_output(
  argv: &[&str],
  environment: Option<&Environment>,
  encoding: Encoding,
  cwd: Option<&Path>,
  check_exit_code: bool,
) -> Result<(i32, String), ScriptError> {
  let output = run_subprocess(
    argv,
    environment,
    cwd,
    Level::DEBUG,
    StdoutMode::Capture,
    StderrMode::Capture,
  )?;

  if check_exit_code && !output.success() {
    return Err(subprocess_failure(argv, &output));
  }

  Ok((output.exit_code, encoding.decode(&output.stdout)?))
}

fn subprocess_failure(argv: &[&str], output: &ScriptOutput) -> ScriptError {
  error!(exit_code = output.exit_code, "internal subprocess failed: {:?}", argv);
  ScriptError::InternalSubprocess {
    argv: argv.iter().map(|a| a.to_string()).collect(),
    exit_code: output.exit_code,
    output: output.combined_lossy(),
  }
}

/// Run `argv` and return the finished process, whatever its exit code.
///
/// With [`StderrMode::ToStdout`] both streams are captured and stderr is
/// appended to stdout once the process exits.
pub fn run_subprocess(
  argv: &[&str],
  environment: Option<&Environment>,
  cwd: Option<&Path>,
  level: Level,
  stdout: StdoutMode,
  stderr: StderrMode,
) -> Result<ScriptOutput, ScriptError> {
  let Some((program, args)) = argv.split_first() else {
    return Err(ScriptError::Spawn {
      program: String::new(),
      source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
    });
  };

  let mut message = format!("The following program is going to be executed: {argv:?}");
  if let Some(cwd) = cwd {
    message.push_str(&format!(" in {}", cwd.display()));
  }
  log_at(level, &message);

  let mut command = Command::new(program);
  command.args(args);

  if let Some(cwd) = cwd {
    command.current_dir(cwd);
  }

  if let Some(environment) = environment {
    for (name, value) in environment.iter() {
      match value {
        Some(value) => command.env(name, value),
        None => command.env_remove(name),
      };
    }
  }

  let merge = stderr == StderrMode::ToStdout;
  let stderr = if merge { StderrMode::Capture } else { stderr };
  let stdout = if merge { StdoutMode::Capture } else { stdout };

  let output = command
    .stdout(stdout.stdio())
    .stderr(stderr.stdio())
    .output()
    .map_err(|source| ScriptError::Spawn {
      program: program.to_string(),
      source,
    })?;

  let mut output = ScriptOutput::from(output);
  if merge {
    let stderr = std::mem::take(&mut output.stderr);
    output.stdout.extend(stderr);
  }

  Ok(output)
}
