use std::path::PathBuf;

use orchestra_lib::config::{ConfigError, Configuration};
use serial_test::serial;
use tempfile::TempDir;

use super::common::{PROJECT_CONFIG, load_config};

#[test]
fn paths_resolve_against_config_directory() {
  let temp = TempDir::new().unwrap();
  let config = load_config(temp.path(), r#"{ "paths": { "sources_dir": "src", "builds_dir": "/opt/builds" } }"#);
  let base = dunce::canonicalize(temp.path()).unwrap();

  assert_eq!(config.sources_dir, base.join("src"));
  assert_eq!(config.builds_dir, PathBuf::from("/opt/builds"));
  assert_eq!(config.orchestra_root, base.join("root"));
  assert_eq!(config.tmproot, base.join(".orchestra").join("tmproot"));
  assert_eq!(config.remote_heads_cache_path(), base.join(".orchestra").join("remote_refs_cache.json"));
}

#[test]
fn components_keep_declaration_order() {
  let temp = TempDir::new().unwrap();
  let config = load_config(temp.path(), PROJECT_CONFIG);

  let names: Vec<_> = config.components().map(|c| c.name.as_str()).collect();
  assert_eq!(names, vec!["toolchain", "libfoo", "app"]);
  assert_eq!(config.component("libfoo").unwrap().default_build_name(), "release");
  assert!(!config.component("toolchain").unwrap().is_cloneable());
}

#[test]
fn user_environment_overrides_globals() {
  let temp = TempDir::new().unwrap();
  let config = load_config(
    temp.path(),
    r#"{ "environment": [ { "name": "GIT_ASKPASS", "value": "/usr/bin/askpass" }, { "name": "LD_PRELOAD" } ] }"#,
  );

  let env = config.global_env();
  assert_eq!(env.get("GIT_ASKPASS"), Some("/usr/bin/askpass"));
  assert!(env.is_unset("LD_PRELOAD"));
  assert!(env.get("RPATH_PLACEHOLDER").unwrap().ends_with("$ORCHESTRA_ROOT"));
}

#[test]
fn invalid_documents_are_rejected() {
  let temp = TempDir::new().unwrap();
  let cases = [
    r#"{ "components": { "empty": { "builds": {} } } }"#,
    r#"{ "environment": [ { "name": "TMP_ROOTS" } ] }"#,
    r#"{ "components": [] }"#,
  ];

  for text in cases {
    let result = Configuration::from_json(text, temp.path());
    assert!(
      matches!(
        result,
        Err(ConfigError::NoBuilds(_) | ConfigError::ReservedVariable(_) | ConfigError::Parse(_))
      ),
      "{text} should be rejected"
    );
  }
}

#[test]
#[serial]
fn discover_reports_every_candidate() {
  let temp = TempDir::new().unwrap();
  let missing = temp.path().join("missing.json");

  temp_env::with_var("ORCHESTRA_CONFIG", Some(&missing), || {
    let err = Configuration::discover(None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("missing.json"), "{message}");
    assert!(message.contains("orchestra.json"), "{message}");
  });
}
