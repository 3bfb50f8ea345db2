//! Hashing utilities for action identity.
//!
//! This module provides:
//! - `ContentHash`: a full 64-character SHA-256 hash
//! - `hash_fields()`: unambiguous hashing of a sequence of strings

use sha2::{Digest, Sha256};

/// A full 64-character SHA-256 hash, lowercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash a sequence of fields.
///
/// Each field is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
pub fn hash_fields<I, S>(fields: I) -> ContentHash
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut hasher = Sha256::new();
  for field in fields {
    let field = field.as_ref();
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
  }
  ContentHash(format!("{:x}", hasher.finalize()))
}
