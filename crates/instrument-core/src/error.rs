//! Error types for `instrument-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Stored text is not syntactically valid JSON.
  #[error("malformed document content: {0}")]
  MalformedContent(#[source] serde_json::Error),

  /// Stored text is valid JSON but not an object.
  #[error("malformed document content: expected a JSON object, found {0}")]
  NotAnObject(&'static str),

  #[error("failed to encode document: {0}")]
  Encoding(#[source] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
