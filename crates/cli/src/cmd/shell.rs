//! Implementation of the `orchestra shell` command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{Level, warn};

use orchestra_lib::environment::{Environment, shell_quote};
use orchestra_lib::script::{Encoding, ScriptOptions, exec_script, try_get_script_output};

use super::load_workspace;
use crate::output::print_warning;

const FALLBACK_SHELL: &str = "/bin/sh";

/// Startup file installed as `.bashrc` and `.zshrc` in the shell home.
const SHELL_RC: &str = r#"if [ -f "$OLD_HOME/.bashrc" ] && [ -n "$BASH_VERSION" ]; then . "$OLD_HOME/.bashrc"; fi
if [ -f "$OLD_HOME/.zshrc" ] && [ -n "$ZSH_VERSION" ]; then . "$OLD_HOME/.zshrc"; fi
PS1="${PS1_PREFIX}${PS1}"
"#;

/// Run `command` (or the user's login shell) in the orchestra environment,
/// replacing this process.
///
/// With a component, the environment is that of its build and the command
/// starts in the build directory, which must already exist.
pub fn cmd_shell(config: Option<&Path>, component: Option<&str>, command: &[String]) -> Result<()> {
  let workspace = load_workspace(config)?;

  let (mut environment, cwd, prompt) = match component {
    Some(name) => {
      let actions = workspace
        .get_build(name)
        .with_context(|| format!("Unknown component or build {name}"))?;
      let build_dir = actions
        .configure
        .build_dir()
        .with_context(|| format!("{name} has no build directory"))?;
      if !build_dir.is_dir() {
        bail!(
          "Build directory {} does not exist, configure {name} first",
          build_dir.display()
        );
      }
      let prompt = prompt_prefix(Some(&actions.build.qualified_name()));
      (actions.configure.environment(), Some(build_dir), prompt)
    }
    None => (workspace.config().global_env(), None, prompt_prefix(None)),
  };

  let script = if command.is_empty() {
    let home = prepare_shell_home(&workspace.config().orchestra_dotdir)?;
    interactive_environment(&mut environment, std::env::var("HOME").ok().as_deref(), &home, &prompt);
    format!("exec {}", shell_quote(&usable_shell(&user_shell())))
  } else {
    let words: Vec<String> = command.iter().map(|word| shell_quote(word)).collect();
    words.join(" ")
  };

  let options = ScriptOptions::new()
    .with_environment(Some(&environment))
    .with_cwd(cwd.as_deref())
    .strict_flags(false)
    .level(Level::DEBUG);

  let err = exec_script(&script, &options);
  Err(err).with_context(|| format!("Failed to run {script}"))
}

fn prompt_prefix(qualified_name: Option<&str>) -> String {
  match qualified_name {
    Some(name) => format!("(orchestra - {name}) "),
    None => "(orchestra) ".to_string(),
  }
}

/// Point `HOME` at the orchestra shell home, keeping the real one in `OLD_HOME`.
fn interactive_environment(environment: &mut Environment, old_home: Option<&str>, home: &Path, prompt: &str) {
  if let Some(old_home) = old_home {
    environment.set("OLD_HOME", old_home);
  }
  environment.set("HOME", home.to_string_lossy());
  environment.set("PS1_PREFIX", prompt);
}

/// Create the shell home with startup files that chain to the real ones.
fn prepare_shell_home(orchestra_dotdir: &Path) -> Result<PathBuf> {
  let home = orchestra_dotdir.join("shell-home");
  fs::create_dir_all(&home).with_context(|| format!("Failed to create {}", home.display()))?;
  for name in [".bashrc", ".zshrc"] {
    let path = home.join(name);
    fs::write(&path, SHELL_RC).with_context(|| format!("Failed to write {}", path.display()))?;
  }
  Ok(home)
}

/// Login shell of the current user.
fn user_shell() -> String {
  match try_get_script_output("getent passwd \"$(id -un)\" | cut -d: -f7", None, Encoding::Utf8, None) {
    Ok((0, shell)) if !shell.trim().is_empty() => shell.trim().to_string(),
    _ => FALLBACK_SHELL.to_string(),
  }
}

/// `candidate` if it is an executable file, [`FALLBACK_SHELL`] otherwise.
fn usable_shell(candidate: &str) -> String {
  if is_executable(Path::new(candidate)) {
    return candidate.to_string();
  }
  warn!(shell = candidate, "login shell is not executable");
  print_warning(&format!("{candidate} is not executable, falling back to {FALLBACK_SHELL}"));
  FALLBACK_SHELL.to_string()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}
