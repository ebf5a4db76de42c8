//! [`SqliteStore`], the SQLite implementation of [`InstrumentStore`].

use std::path::Path;

use instrument_core::{
  CollectionInstrument, InstrumentId, StoredInstrument, codec, store::InstrumentStore,
};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use serde_json::Value;

use crate::{
  ContainmentFilter, DuplicateReferencePolicy, Error, Result, StoreOptions,
  build_reference_filter, build_urn_filter, encode::RawRow, schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A collection instrument store backed by a single SQLite file.
///
/// Clones share one connection; every operation hands one closure to the
/// connection's worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  options: StoreOptions,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, options };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, options };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// All rows matching `filter` (every row if `None`), ordered by id.
  async fn select(&self, filter: Option<ContainmentFilter>) -> Result<Vec<RawRow>> {
    let rows = self
      .conn
      .call(move |conn| {
        let rows = read_only(conn, |tx| {
          let (predicate, params): (&str, &[SqlValue]) = match &filter {
            Some(f) => (f.predicate(), f.params()),
            None => ("1", &[]),
          };
          let mut stmt = tx.prepare(&format!(
            "SELECT id, content FROM collection_instruments
             WHERE {predicate}
             ORDER BY id ASC"
          ))?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(params), RawRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Insert `content` verbatim, bypassing the encoder. Used to seed rows in
  /// the older document shapes.
  #[cfg(test)]
  pub(crate) async fn insert_raw(&self, content: &str) -> Result<InstrumentId> {
    let content = content.to_owned();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO collection_instruments (content) VALUES (?1)",
          rusqlite::params![content],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(InstrumentId(id))
  }
}

/// Run `f` inside a transaction on a connection switched to `query_only`, so
/// reads see one consistent snapshot and cannot write. The pragma is reset
/// whether or not `f` succeeds.
fn read_only<T>(
  conn: &mut rusqlite::Connection,
  f:    impl FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
  conn.pragma_update(None, "query_only", true)?;
  let result = (|| -> rusqlite::Result<T> {
    let tx = conn.transaction()?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
  })();
  conn.pragma_update(None, "query_only", false)?;
  result
}

/// Decode `raws`, dropping rows whose decoded document fails `keep`.
///
/// SQLite reads the first of a repeated key while the decoder keeps the
/// last, so a row selected by an alias filter can still decode to another
/// value.
fn decode_matching(
  raws: Vec<RawRow>,
  keep: impl Fn(&CollectionInstrument) -> bool,
) -> Result<Vec<StoredInstrument>> {
  let mut matches = Vec::with_capacity(raws.len());
  for raw in raws {
    let stored = raw.into_stored()?;
    if keep(&stored.instrument) {
      matches.push(stored);
    } else {
      tracing::warn!(
        id = %stored.id,
        "row matched the lookup filter but decodes differently; skipped"
      );
    }
  }
  Ok(matches)
}

// ─── InstrumentStore impl ────────────────────────────────────────────────────

impl InstrumentStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create(&self, instrument: CollectionInstrument) -> Result<InstrumentId> {
    let content = codec::encode(&instrument)?;

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO collection_instruments (content) VALUES (?1)",
          rusqlite::params![content],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::debug!(id, "created collection instrument");
    Ok(InstrumentId(id))
  }

  async fn replace(&self, id: InstrumentId, instrument: CollectionInstrument) -> Result<()> {
    let content = codec::encode(&instrument)?;
    let row_id = id.0;

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE collection_instruments SET content = ?1 WHERE id = ?2",
          rusqlite::params![content, row_id],
        )?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound(id));
    }
    tracing::debug!(%id, "replaced collection instrument");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn read_by_id(&self, id: InstrumentId) -> Result<Option<StoredInstrument>> {
    let row_id = id.0;

    let raw: Option<RawRow> = self
      .conn
      .call(move |conn| {
        let raw = read_only(conn, |tx| {
          tx.query_row(
            "SELECT id, content FROM collection_instruments WHERE id = ?1",
            rusqlite::params![row_id],
            RawRow::from_row,
          )
          .optional()
        })?;
        Ok(raw)
      })
      .await?;

    if raw.is_none() {
      tracing::debug!(%id, "no collection instrument with this id");
    }
    raw.map(RawRow::into_stored).transpose()
  }

  async fn read_by_reference(&self, reference: &str) -> Result<Option<StoredInstrument>> {
    let raws = self.select(Some(build_reference_filter(reference))).await?;
    let matches = decode_matching(raws, |ci| ci.reference.as_deref() == Some(reference))?;

    let count = matches.len();
    if count > 1 {
      match self.options.duplicate_references {
        DuplicateReferencePolicy::Reject => {
          return Err(Error::AmbiguousReference {
            reference: reference.to_owned(),
            count,
          });
        }
        DuplicateReferencePolicy::FirstById => {
          tracing::warn!(reference, count, "reference is not unique; using lowest id");
        }
      }
    }

    let found = matches.into_iter().next();
    if found.is_none() {
      tracing::debug!(reference, "no collection instrument with this reference");
    }
    Ok(found)
  }

  async fn find_by_urn(&self, urn: &str) -> Result<Vec<StoredInstrument>> {
    let raws = self.select(Some(build_urn_filter(urn))).await?;
    decode_matching(raws, |ci| ci.urn.as_deref() == Some(urn))
  }

  async fn list(&self) -> Result<Vec<StoredInstrument>> {
    let raws = self.select(None).await?;
    raws.into_iter().map(RawRow::into_stored).collect()
  }

  async fn find_containing(&self, fragment: &Value) -> Result<Vec<StoredInstrument>> {
    let filter = ContainmentFilter::for_fragment(fragment)?;
    let raws = self.select(Some(filter)).await?;
    raws.into_iter().map(RawRow::into_stored).collect()
  }
}
