//! Shared utilities.
//!
//! Hashing, single-flight memoization and test helpers.

pub mod hash;
pub mod memo;

#[cfg(test)]
pub mod testutil;
