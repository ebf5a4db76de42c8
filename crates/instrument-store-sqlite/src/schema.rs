//! SQL schema for the collection instrument store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout version; document shapes inside `content` are not versioned here.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One document per row. Rows are replaced wholesale and never deleted.
CREATE TABLE IF NOT EXISTS collection_instruments (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL CHECK (json_valid(content))
);

CREATE INDEX IF NOT EXISTS collection_instruments_reference_idx
    ON collection_instruments (json_extract(content, '$.reference'));

PRAGMA user_version = 1;
";
