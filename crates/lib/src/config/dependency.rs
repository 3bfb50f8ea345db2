//! Dependency string parsing.

use super::ConfigError;

/// A parsed dependency declaration.
///
/// Dependencies are written in one of three forms:
///
/// - `component`: any build of `component`, preferring its default build
/// - `component@build`: exactly `build`
/// - `component~build`: any build of `component`, preferring `build`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
  pub component: String,
  pub build: Option<String>,
  /// True for the `@` form.
  pub exact: bool,
}

pub fn parse_dependency(dependency: &str) -> Result<DependencySpec, ConfigError> {
  let invalid = || ConfigError::InvalidDependency(dependency.to_string());

  let (component, rest) = match dependency.find(['@', '~']) {
    Some(index) => (&dependency[..index], Some(&dependency[index..])),
    None => (dependency, None),
  };

  if !is_valid_name(component) {
    return Err(invalid());
  }

  let Some(rest) = rest else {
    return Ok(DependencySpec {
      component: component.to_string(),
      build: None,
      exact: false,
    });
  };

  let exact = rest.starts_with('@');
  let build = &rest[1..];
  if !is_valid_name(build) {
    return Err(invalid());
  }

  Ok(DependencySpec {
    component: component.to_string(),
    build: Some(build.to_string()),
    exact,
  })
}

fn is_valid_name(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '/'))
}
