//! The `InstrumentStore` trait and the error classification shared by all
//! backends.
//!
//! The trait is implemented by storage backends (e.g.
//! `instrument-store-sqlite`). Transport layers depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde_json::Value;

use crate::{CollectionInstrument, InstrumentId, StoredInstrument};

// ─── Error classification ────────────────────────────────────────────────────

/// Backend-independent category of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A key-based operation found no row.
  NotFound,
  /// Stored content could not be decoded.
  MalformedContent,
  /// The store could not be reached or failed to execute.
  StorageUnavailable,
  /// A reference lookup matched more than one row and the store is
  /// configured to reject that.
  AmbiguousReference,
  /// The document could not be encoded.
  Encoding,
  /// The caller supplied an unusable query fragment.
  InvalidQuery,
}

/// Implemented by every backend error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for crate::Error {
  fn kind(&self) -> ErrorKind {
    match self {
      crate::Error::MalformedContent(_) | crate::Error::NotAnObject(_) => {
        ErrorKind::MalformedContent
      }
      crate::Error::Encoding(_) => ErrorKind::Encoding,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a collection instrument repository.
///
/// Documents are created, replaced wholesale, and read; they are never
/// deleted. Lookups that find nothing return `Ok(None)` rather than an error.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait InstrumentStore: Send + Sync {
  type Error: StoreError;

  /// Store a new document and return the id the store assigned to it.
  fn create(
    &self,
    instrument: CollectionInstrument,
  ) -> impl Future<Output = Result<InstrumentId, Self::Error>> + Send + '_;

  /// Replace the whole document stored under `id`. Fails with a
  /// [`ErrorKind::NotFound`] error if there is no such row.
  fn replace(
    &self,
    id: InstrumentId,
    instrument: CollectionInstrument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up one row by surrogate key.
  fn read_by_id(
    &self,
    id: InstrumentId,
  ) -> impl Future<Output = Result<Option<StoredInstrument>, Self::Error>> + Send + '_;

  /// Look up a row whose document carries exactly this `reference`.
  ///
  /// References are not unique; how multiple matches are handled is up to
  /// the backend's configuration.
  fn read_by_reference<'a>(
    &'a self,
    reference: &'a str,
  ) -> impl Future<Output = Result<Option<StoredInstrument>, Self::Error>> + Send + 'a;

  /// Every row whose document carries exactly this instrument `urn`, ordered
  /// by id. The oldest shapes keep the URN under `id`; those rows match too.
  fn find_by_urn<'a>(
    &'a self,
    urn: &'a str,
  ) -> impl Future<Output = Result<Vec<StoredInstrument>, Self::Error>> + Send + 'a;

  /// Every stored document, ordered by id. An empty store yields an empty
  /// vector.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<StoredInstrument>, Self::Error>> + Send + '_;

  /// Every stored document that contains `fragment` (a JSON object) as a
  /// structural subset, ordered by id.
  fn find_containing<'a>(
    &'a self,
    fragment: &'a Value,
  ) -> impl Future<Output = Result<Vec<StoredInstrument>, Self::Error>> + Send + 'a;
}
