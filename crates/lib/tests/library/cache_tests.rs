use orchestra_lib::remote::RemoteHeadsCache;
use tempfile::TempDir;

use super::common::{CountingLister, PROJECT_CONFIG, load_config};

#[tokio::test]
async fn rebuild_persists_and_reloads() {
  let temp = TempDir::new().unwrap();
  let config = load_config(temp.path(), PROJECT_CONFIG);
  let lister = CountingLister::new(&[
    ("https://fallback.example.com/libfoo", "1111\trefs/heads/master\n"),
    ("https://primary.example.com/apps/app", "2222\trefs/heads/develop\n3333\trefs/heads/master\n"),
  ]);

  let mut cache = RemoteHeadsCache::load(config.clone(), lister.clone()).unwrap();
  let failed = cache.rebuild(4).await.unwrap();
  assert!(failed.is_empty());
  // libfoo: both mirrors; app: primary only; toolchain is not cloneable
  assert_eq!(lister.calls(), 3);

  let reloaded = RemoteHeadsCache::load(config, CountingLister::new(&[])).unwrap();
  assert_eq!(reloaded.heads("libfoo").unwrap()["master"], "1111");
  assert_eq!(reloaded.heads("app").unwrap().len(), 2);
  assert!(reloaded.heads("toolchain").is_none());
}

#[tokio::test]
async fn unanswered_repositories_are_reported() {
  let temp = TempDir::new().unwrap();
  let config = load_config(temp.path(), PROJECT_CONFIG);
  let lister = CountingLister::new(&[("https://primary.example.com/libfoo", "1111\trefs/heads/master\n")]);

  let mut cache = RemoteHeadsCache::load(config, lister).unwrap();
  let failed = cache.rebuild(1).await.unwrap();

  assert_eq!(failed.into_iter().collect::<Vec<_>>(), vec!["apps/app".to_string()]);
  assert!(cache.heads("app").is_none());
  assert!(cache.path().exists());
}

#[test]
fn set_entry_updates_single_branch() {
  let temp = TempDir::new().unwrap();
  let config = load_config(temp.path(), PROJECT_CONFIG);

  let mut cache = RemoteHeadsCache::load(config.clone(), CountingLister::new(&[])).unwrap();
  cache.set_entry("libfoo", "master", "abcd").unwrap();
  cache.set_entry("libfoo", "develop", "ef01").unwrap();

  let reloaded = RemoteHeadsCache::load(config, CountingLister::new(&[])).unwrap();
  let heads = reloaded.heads("libfoo").unwrap();
  assert_eq!(heads["master"], "abcd");
  assert_eq!(heads["develop"], "ef01");
}
