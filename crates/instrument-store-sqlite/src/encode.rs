//! Conversion between rows of `collection_instruments` and domain types.

use instrument_core::{InstrumentId, StoredInstrument, codec};

use crate::{Error, Result};

/// Raw column values read directly from a `collection_instruments` row.
pub struct RawRow {
  pub id:      i64,
  pub content: String,
}

impl RawRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawRow {
      id:      row.get(0)?,
      content: row.get(1)?,
    })
  }

  /// Decode the content. A row that cannot be decoded is reported, never
  /// replaced with an empty document.
  pub fn into_stored(self) -> Result<StoredInstrument> {
    let id = InstrumentId(self.id);
    match codec::decode_with_variant(&self.content) {
      Ok((instrument, variant)) => {
        tracing::trace!(%id, ?variant, "decoded collection instrument");
        Ok(StoredInstrument { id, instrument })
      }
      Err(source) => {
        tracing::error!(%id, error = %source, "stored content is malformed");
        Err(Error::MalformedRow { id, source })
      }
    }
  }
}
