//! Ordered environment variable mappings.
//!
//! Scripts receive their environment as a sequence of `export` statements, so
//! assignment order matters: a value may reference any variable assigned
//! before it (e.g. `RPATH_PLACEHOLDER` refers to `$ORCHESTRA_ROOT`).
//! [`Environment`] keeps first-insertion order and lets later layers replace a
//! value in place or unset it.

use indexmap::IndexMap;

/// An insertion-ordered mapping of environment variable names to values.
///
/// A `None` value marks a variable that must be unset in the script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
  vars: IndexMap<String, Option<String>>,
}

impl Environment {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set `name` to `value`. An existing entry keeps its position.
  pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.vars.insert(name.into(), Some(value.into()));
  }

  /// Mark `name` as unset. An existing entry keeps its position.
  pub fn unset(&mut self, name: impl Into<String>) {
    self.vars.insert(name.into(), None);
  }

  /// Returns the value of `name`, or `None` if it is absent or unset.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).and_then(|v| v.as_deref())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  pub fn is_unset(&self, name: &str) -> bool {
    matches!(self.vars.get(name), Some(None))
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Iterate over entries in assignment order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.vars.keys().map(String::as_str)
  }

  /// Apply every entry of `other` on top of this environment.
  pub fn extend(&mut self, other: &Environment) {
    for (name, value) in &other.vars {
      self.vars.insert(name.clone(), value.clone());
    }
  }

  /// Render the environment as POSIX shell statements, one per line.
  ///
  /// Values are double-quoted so that `$` references stay live.
  pub fn export_script(&self) -> String {
    let mut script = String::new();
    for (name, value) in &self.vars {
      match value {
        Some(value) => script.push_str(&format!("export {}={}\n", name, double_quote(value))),
        None => script.push_str(&format!("unset {}\n", name)),
      }
    }
    script
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut env = Environment::new();
    for (name, value) in iter {
      env.set(name, value);
    }
    env
  }
}

/// Quote `value` for use inside double quotes, keeping parameter expansion.
fn double_quote(value: &str) -> String {
  let mut quoted = String::with_capacity(value.len() + 2);
  quoted.push('"');
  for c in value.chars() {
    if matches!(c, '"' | '\\' | '`') {
      quoted.push('\\');
    }
    quoted.push(c);
  }
  quoted.push('"');
  quoted
}

/// Quote `word` so the shell treats it as a single literal argument.
pub fn shell_quote(word: &str) -> String {
  if !word.is_empty()
    && word
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ','))
  {
    return word.to_string();
  }
  format!("'{}'", word.replace('\'', r"'\''"))
}
