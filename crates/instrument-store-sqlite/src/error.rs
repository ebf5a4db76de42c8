//! Error type for `instrument-store-sqlite`.

use instrument_core::{
  InstrumentId,
  store::{ErrorKind, StoreError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] instrument_core::Error),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[from] tokio_rusqlite::Error),

  /// A stored row could not be decoded. This is a data-integrity fault.
  #[error("row {id} holds malformed content: {source}")]
  MalformedRow {
    id:     InstrumentId,
    source: instrument_core::Error,
  },

  #[error("collection instrument not found: {0}")]
  NotFound(InstrumentId),

  #[error("reference {reference:?} matches {count} collection instruments")]
  AmbiguousReference { reference: String, count: usize },

  #[error("invalid containment fragment: {0}")]
  InvalidFragment(String),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
      Error::MalformedRow { .. } => ErrorKind::MalformedContent,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::AmbiguousReference { .. } => ErrorKind::AmbiguousReference,
      Error::InvalidFragment(_) => ErrorKind::InvalidQuery,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
