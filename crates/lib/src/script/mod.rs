//! Script and subprocess execution.
//!
//! Every primitive blocks until the child exits. Two independent axes decide
//! how a nonzero exit is reported:
//!
//! - **who wrote it**: user scripts fail with [`ScriptError::UserScript`],
//!   internal scripts and subprocesses with the internal variants;
//! - **whether failure is expected**: the `try_` variants return the exit code
//!   instead of an error.
//!
//! Shell scripts run under `/bin/bash -c`. The composed environment is
//! exported at the top of the script rather than passed to the process, so
//! that values can reference variables assigned before them.

mod subprocess;
mod types;

pub use subprocess::*;
pub use types::*;

use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Level, debug, error, info, trace, warn};

use crate::consts::SHELL;
use crate::environment::{Environment, shell_quote};

/// Aborts on the first failing command, on unset variables and on failures
/// inside pipelines.
pub const STRICT_PRELUDE: &str = "set -o errexit\nset -o nounset\nset -o pipefail\n";

static QUIET: AtomicBool = AtomicBool::new(false);

/// When quiet, user script output is captured instead of shown.
pub fn set_quiet(quiet: bool) {
  QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
  QUIET.load(Ordering::Relaxed)
}

/// Run a user script, failing with [`ScriptError::UserScript`] on a nonzero exit.
pub fn run_user_script(script: &str, environment: Option<&Environment>, cwd: Option<&Path>) -> Result<(), ScriptError> {
  let (stdout, stderr) = if is_quiet() {
    (StdoutMode::Capture, StderrMode::ToStdout)
  } else {
    (StdoutMode::Inherit, StderrMode::Inherit)
  };

  let options = ScriptOptions::new()
    .with_environment(environment)
    .with_cwd(cwd)
    .level(Level::INFO)
    .stdout(stdout)
    .stderr(stderr);
  let output = run_script(script, &options)?;

  if !output.success() {
    error!(exit_code = output.exit_code, "user script failed:\n{}", script.trim());
    return Err(ScriptError::UserScript {
      script: script.to_string(),
      exit_code: output.exit_code,
      output: output.combined_lossy(),
    });
  }

  Ok(())
}

/// Run an internal script, failing with [`ScriptError::InternalScript`] on a nonzero exit.
pub fn run_internal_script(
  script: &str,
  environment: Option<&Environment>,
  cwd: Option<&Path>,
) -> Result<(), ScriptError> {
  run_internal(script, environment, cwd, true).map(|_| ())
}

/// Run an internal script that is allowed to fail and return its exit code.
pub fn try_run_internal_script(
  script: &str,
  environment: Option<&Environment>,
  cwd: Option<&Path>,
) -> Result<i32, ScriptError> {
  run_internal(script, environment, cwd, false)
}

fn run_internal(
  script: &str,
  environment: Option<&Environment>,
  cwd: Option<&Path>,
  check_exit_code: bool,
) -> Result<i32, ScriptError> {
  let options = ScriptOptions::new()
    .with_environment(environment)
    .with_cwd(cwd)
    .level(Level::DEBUG)
    .stdout(StdoutMode::Capture)
    .stderr(StderrMode::ToStdout);
  let output = run_script(script, &options)?;

  if check_exit_code && !output.success() {
    error!(exit_code = output.exit_code, "internal script failed:\n{}", script.trim());
    return Err(ScriptError::InternalScript {
      script: script.to_string(),
      exit_code: output.exit_code,
      output: output.combined_lossy(),
    });
  }

  debug!("Script output was:\n{}", output.combined_lossy());
  Ok(output.exit_code)
}

/// Run an internal script and return its decoded stdout.
pub fn get_script_output(
  script: &str,
  environment: Option<&Environment>,
  encoding: Encoding,
  cwd: Option<&Path>,
) -> Result<String, ScriptError> {
  script_output(script, environment, encoding, cwd, true).map(|(_, output)| output)
}

/// Run an internal script that is allowed to fail; returns `(exit_code, stdout)`.
pub fn try_get_script_output(
  script: &str,
  environment: Option<&Environment>,
  encoding: Encoding,
  cwd: Option<&Path>,
) -> Result<(i32, String), ScriptError> {
  script_output(script, environment, encoding, cwd, false)
}

fn script_output(
  script: &str,
  environment: Option<&Environment>,
  encoding: Encoding,
  cwd: Option<&Path>,
  check_exit_code: bool,
) -> Result<(i32, String), ScriptError> {
  let options = ScriptOptions::new()
    .with_environment(environment)
    .with_cwd(cwd)
    .level(Level::DEBUG)
    .stdout(StdoutMode::Capture)
    .stderr(StderrMode::Capture);
  let output = run_script(script, &options)?;

  if check_exit_code && !output.success() {
    error!(exit_code = output.exit_code, "internal script failed:\n{}", script.trim());
    return Err(ScriptError::InternalScript {
      script: script.to_string(),
      exit_code: output.exit_code,
      output: output.combined_lossy(),
    });
  }

  Ok((output.exit_code, encoding.decode(&output.stdout)?))
}

/// Run a shell script and return the finished process, whatever its exit code.
///
/// Fails only if the shell could not be started.
pub fn run_script(script: &str, options: &ScriptOptions<'_>) -> Result<ScriptOutput, ScriptError> {
  let wrapped = wrap_script(script, options);
  log_at(
    options.level,
    &format!("The following script is going to be executed:\n{}\n", script.trim()),
  );

  let output = Command::new(SHELL)
    .arg("-c")
    .arg(&wrapped)
    .stdout(options.stdout.stdio())
    .stderr(options.stderr.stdio())
    .output()
    .map_err(|source| ScriptError::Spawn {
      program: SHELL.to_string(),
      source,
    })?;

  Ok(ScriptOutput::from(output))
}

/// Replace the current process with a shell running `script`.
///
/// Only returns if the process image could not be replaced. On platforms
/// without `exec`, the script runs as a child and the current process exits
/// with the child's exit code.
pub fn exec_script(script: &str, options: &ScriptOptions<'_>) -> ScriptError {
  let wrapped = wrap_script(script, options);
  log_at(
    options.level,
    &format!("The following script is going to be exec'ed into:\n{}\n", script.trim()),
  );

  let mut command = Command::new(SHELL);
  command.arg("-c").arg(&wrapped);

  #[cfg(unix)]
  {
    use std::os::unix::process::CommandExt;
    let source = command.exec();
    ScriptError::Exec {
      program: SHELL.to_string(),
      source,
    }
  }

  #[cfg(not(unix))]
  {
    match command.status() {
      Ok(status) => std::process::exit(types::exit_code(status)),
      Err(source) => ScriptError::Exec {
        program: SHELL.to_string(),
        source,
      },
    }
  }
}

/// Assemble the text handed to the shell: stderr redirection, strict prelude,
/// environment exports, working directory change, then the script itself.
pub(crate) fn wrap_script(script: &str, options: &ScriptOptions<'_>) -> String {
  let mut wrapped = String::new();

  if options.stderr == StderrMode::ToStdout {
    wrapped.push_str("exec 2>&1\n");
  }

  if options.strict_flags {
    wrapped.push_str(STRICT_PRELUDE);
  }

  if let Some(environment) = options.environment {
    wrapped.push_str(&environment.export_script());
  }

  if let Some(cwd) = options.cwd {
    wrapped.push_str(&format!("cd {}\n", shell_quote(&cwd.to_string_lossy())));
  }

  wrapped.push_str(script);
  wrapped
}

pub(crate) fn log_at(level: Level, message: &str) {
  if level == Level::ERROR {
    error!("{message}");
  } else if level == Level::WARN {
    warn!("{message}");
  } else if level == Level::INFO {
    info!("{message}");
  } else if level == Level::DEBUG {
    debug!("{message}");
  } else {
    trace!("{message}");
  }
}
