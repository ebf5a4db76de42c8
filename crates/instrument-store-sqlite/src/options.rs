//! Tunables for [`SqliteStore`](crate::SqliteStore).

use serde::Deserialize;

/// What a reference lookup does when several rows carry the same reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReferencePolicy {
  /// Return the match with the lowest id and log a warning.
  #[default]
  FirstById,
  /// Fail with [`Error::AmbiguousReference`](crate::Error::AmbiguousReference).
  Reject,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreOptions {
  #[serde(default)]
  pub duplicate_references: DuplicateReferencePolicy,
}
