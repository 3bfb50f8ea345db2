use orchestra_lib::graph::DependencyGraph;
use orchestra_lib::workspace::Workspace;
use tempfile::TempDir;

use super::common::{CountingLister, PROJECT_CONFIG, load_config};

#[test]
fn dependency_chain_is_wired() {
  let temp = TempDir::new().unwrap();
  let workspace = Workspace::with_lister(load_config(temp.path(), PROJECT_CONFIG), CountingLister::new(&[])).unwrap();

  let app = workspace.get_build("app").unwrap();
  let libfoo = workspace.get_build("libfoo@release").unwrap();
  let toolchain = workspace.get_build("toolchain").unwrap();

  assert!(app.install.dependencies().contains(&libfoo.install));
  assert!(libfoo.configure.dependencies().contains(&toolchain.install));
  assert!(!libfoo.install.dependencies().contains(&toolchain.install));
  assert!(toolchain.configure.dependencies().is_empty());
}

#[test]
fn graph_covers_transitive_dependencies() {
  let temp = TempDir::new().unwrap();
  let workspace = Workspace::with_lister(load_config(temp.path(), PROJECT_CONFIG), CountingLister::new(&[])).unwrap();

  let app = workspace.get_build("app").unwrap();
  let graph = DependencyGraph::from_roots([&app.install]);

  // app and libfoo: clone, configure, install; toolchain: configure, install
  assert_eq!(graph.node_count(), 8);

  let text = graph.render().unwrap();
  assert!(text.starts_with("digraph dependency_graph {\n  splines=ortho\n"));
  assert!(text.contains("\"install toolchain@default\" -> \"configure libfoo@release\";"));
  assert!(text.contains("\"clone app\" -> \"configure app@default\";"));
  assert!(!text.contains("libfoo@debug"));
}

#[test]
fn remote_heads_are_shared_per_clone() {
  let temp = TempDir::new().unwrap();
  let lister = CountingLister::new(&[(
    "https://primary.example.com/libfoo",
    "0123abcd\trefs/heads/master\n4567ef01\trefs/heads/feature\n",
  )]);
  let workspace = Workspace::with_lister(load_config(temp.path(), PROJECT_CONFIG), lister.clone()).unwrap();

  let release = workspace.get_build("libfoo@release").unwrap();
  let debug = workspace.get_build("libfoo@debug").unwrap();

  assert_eq!(release.configure.remote_head(), Some("0123abcd".to_string()));
  assert_eq!(debug.configure.remote_head(), Some("0123abcd".to_string()));
  assert_eq!(lister.calls(), 1);
}

#[test]
fn hash_changes_with_remote_head() {
  let temp = TempDir::new().unwrap();
  let config = load_config(temp.path(), PROJECT_CONFIG);

  let first = Workspace::with_lister(
    config.clone(),
    CountingLister::new(&[("https://primary.example.com/libfoo", "aaaa\trefs/heads/develop\n")]),
  )
  .unwrap();
  let second = Workspace::with_lister(
    config,
    CountingLister::new(&[("https://primary.example.com/libfoo", "bbbb\trefs/heads/develop\n")]),
  )
  .unwrap();

  let hash = |workspace: &Workspace, build: &str| workspace.get_build(build).unwrap().install.recursive_hash().unwrap();

  assert_ne!(hash(&first, "libfoo@release"), hash(&second, "libfoo@release"));
  assert_eq!(hash(&first, "toolchain"), hash(&second, "toolchain"));
}
