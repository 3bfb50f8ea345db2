//! Types for script and subprocess execution.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};

use thiserror::Error;
use tracing::Level;

use crate::environment::Environment;

/// Who is to blame when a script fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// A script written by a component maintainer: the recipe is broken.
  User,
  /// A script or program run by orchestra itself: orchestra is broken.
  Internal,
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FailureKind::User => write!(f, "user"),
      FailureKind::Internal => write!(f, "internal"),
    }
  }
}

/// Errors that can occur while running scripts and subprocesses.
#[derive(Debug, Error)]
pub enum ScriptError {
  /// A user script exited with a nonzero code.
  #[error("user script failed with exit code {exit_code}:\n{script}")]
  UserScript {
    script: String,
    exit_code: i32,
    output: String,
  },

  /// An internal script exited with a nonzero code.
  #[error("internal script failed with exit code {exit_code}:\n{script}")]
  InternalScript {
    script: String,
    exit_code: i32,
    output: String,
  },

  /// An internal subprocess exited with a nonzero code.
  #[error("internal subprocess {argv:?} failed with exit code {exit_code}")]
  InternalSubprocess {
    argv: Vec<String>,
    exit_code: i32,
    output: String,
  },

  /// The process could not be started at all.
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// Captured output is not valid in the requested encoding.
  #[error("failed to decode output as {encoding}: {source}")]
  Decode {
    encoding: Encoding,
    #[source]
    source: std::str::Utf8Error,
  },

  /// Replacing the current process image failed.
  #[error("failed to exec into {program}: {source}")]
  Exec {
    program: String,
    #[source]
    source: io::Error,
  },
}

impl ScriptError {
  /// Classify the failure. Only user scripts are blamed on the user.
  pub fn kind(&self) -> FailureKind {
    match self {
      ScriptError::UserScript { .. } => FailureKind::User,
      _ => FailureKind::Internal,
    }
  }

  /// Exit code of the failed process, when it ran to completion.
  pub fn exit_code(&self) -> Option<i32> {
    match self {
      ScriptError::UserScript { exit_code, .. }
      | ScriptError::InternalScript { exit_code, .. }
      | ScriptError::InternalSubprocess { exit_code, .. } => Some(*exit_code),
      _ => None,
    }
  }
}

/// Text encoding used to decode captured output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
  #[default]
  Utf8,
  /// ISO-8859-1: every byte maps to the code point of the same value.
  Latin1,
}

impl Encoding {
  pub fn decode(self, bytes: &[u8]) -> Result<String, ScriptError> {
    match self {
      Encoding::Utf8 => std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|source| ScriptError::Decode { encoding: self, source }),
      Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
  }
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Encoding::Utf8 => write!(f, "utf-8"),
      Encoding::Latin1 => write!(f, "latin-1"),
    }
  }
}

/// Where a child's standard output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdoutMode {
  #[default]
  Inherit,
  Capture,
}

impl StdoutMode {
  pub(crate) fn stdio(self) -> Stdio {
    match self {
      StdoutMode::Inherit => Stdio::inherit(),
      StdoutMode::Capture => Stdio::piped(),
    }
  }
}

/// Where a child's standard error goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StderrMode {
  #[default]
  Inherit,
  Capture,
  /// Send stderr wherever stdout goes.
  ToStdout,
}

impl StderrMode {
  pub(crate) fn stdio(self) -> Stdio {
    match self {
      StderrMode::Inherit | StderrMode::ToStdout => Stdio::inherit(),
      StderrMode::Capture => Stdio::piped(),
    }
  }
}

/// Options for [`run_script`](super::run_script) and [`exec_script`](super::exec_script).
#[derive(Debug, Clone, Copy)]
pub struct ScriptOptions<'a> {
  /// Exported at the beginning of the script.
  pub environment: Option<&'a Environment>,
  /// Prepend `set -o errexit/nounset/pipefail`.
  pub strict_flags: bool,
  /// Directory to `cd` into before the script body runs.
  pub cwd: Option<&'a Path>,
  /// Level at which the script text is logged.
  pub level: Level,
  pub stdout: StdoutMode,
  pub stderr: StderrMode,
}

impl Default for ScriptOptions<'_> {
  fn default() -> Self {
    Self {
      environment: None,
      strict_flags: true,
      cwd: None,
      level: Level::INFO,
      stdout: StdoutMode::Inherit,
      stderr: StderrMode::Inherit,
    }
  }
}

impl<'a> ScriptOptions<'a> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_environment(mut self, environment: Option<&'a Environment>) -> Self {
    self.environment = environment;
    self
  }

  pub fn with_cwd(mut self, cwd: Option<&'a Path>) -> Self {
    self.cwd = cwd;
    self
  }

  pub fn strict_flags(mut self, strict_flags: bool) -> Self {
    self.strict_flags = strict_flags;
    self
  }

  pub fn level(mut self, level: Level) -> Self {
    self.level = level;
    self
  }

  pub fn stdout(mut self, stdout: StdoutMode) -> Self {
    self.stdout = stdout;
    self
  }

  pub fn stderr(mut self, stderr: StderrMode) -> Self {
    self.stderr = stderr;
    self
  }
}

/// Result of a finished process. Never represents a spawn failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
  /// Exit code, or the negated signal number if the process was killed.
  pub exit_code: i32,
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
}

impl ScriptOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }

  /// Stdout followed by stderr, decoded lossily for logs and error messages.
  pub fn combined_lossy(&self) -> String {
    let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&self.stderr));
    text
  }
}

impl From<Output> for ScriptOutput {
  fn from(output: Output) -> Self {
    Self {
      exit_code: exit_code(output.status),
      stdout: output.stdout,
      stderr: output.stderr,
    }
  }
}

pub(crate) fn exit_code(status: ExitStatus) -> i32 {
  if let Some(code) = status.code() {
    return code;
  }

  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
      return -signal;
    }
  }

  -1
}
