//! Per-key memoization shared between threads.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A memo table where each key is computed at most once.
///
/// Concurrent callers asking for the same key block on the one in-flight
/// computation instead of starting their own. Different keys compute in
/// parallel; the table lock is only held to look up the key's cell.
pub struct SingleFlight<K, V> {
  cells: Mutex<HashMap<K, Arc<OnceLock<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
  fn default() -> Self {
    Self {
      cells: Mutex::new(HashMap::new()),
    }
  }
}

impl<K: Eq + Hash + Clone, V: Clone> SingleFlight<K, V> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Return the memoized value for `key`, running `compute` if no caller has yet.
  pub fn get_or_compute(&self, key: &K, compute: impl FnOnce() -> V) -> V {
    let cell = {
      let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
      cells.entry(key.clone()).or_default().clone()
    };
    cell.get_or_init(compute).clone()
  }

  /// Forget every memoized value.
  pub fn clear(&self) {
    self.cells.lock().unwrap_or_else(PoisonError::into_inner).clear();
  }
}

impl<K, V> fmt::Debug for SingleFlight<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let entries = self.cells.lock().map(|cells| cells.len()).unwrap_or_default();
    f.debug_struct("SingleFlight").field("entries", &entries).finish()
  }
}
