//! The collection instrument document and its storage envelope.
//!
//! A collection instrument is stored as one JSON document per row. The row id
//! is assigned by the store and never appears inside the document itself.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{codec, urn};

/// Schema tag stamped onto documents written in the current shape.
pub const CURRENT_SCHEMA: &str = "/schema/collectioninstrument";

// ─── Identity ────────────────────────────────────────────────────────────────

/// Surrogate key of a stored instrument. Assigned once by the store.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InstrumentId(pub i64);

impl fmt::Display for InstrumentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl From<i64> for InstrumentId {
  fn from(id: i64) -> Self { Self(id) }
}

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The known instrument kinds. The stored `type` field stays free-form; this
/// is the interpretation of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
  #[serde(rename = "questionnaire")]
  Questionnaire,
  #[serde(rename = "offline")]
  Offline,
  #[serde(rename = "eQ")]
  Eq,
  #[serde(rename = "SEFT")]
  Seft,
}

impl InstrumentKind {
  pub fn as_str(self) -> &'static str {
    match self {
      InstrumentKind::Questionnaire => "questionnaire",
      InstrumentKind::Offline => "offline",
      InstrumentKind::Eq => "eQ",
      InstrumentKind::Seft => "SEFT",
    }
  }

  /// Interpret a stored type tag. Matching is case-insensitive; the oldest
  /// rows used `ONLINE` for what is now `eQ`.
  pub fn from_tag(tag: &str) -> Option<Self> {
    match tag.trim().to_ascii_lowercase().as_str() {
      "questionnaire" => Some(InstrumentKind::Questionnaire),
      "offline" => Some(InstrumentKind::Offline),
      "eq" | "online" => Some(InstrumentKind::Eq),
      "seft" => Some(InstrumentKind::Seft),
      _ => None,
    }
  }
}

impl fmt::Display for InstrumentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A collection instrument document, in the current shape.
///
/// Every field is optional at the decode boundary: rows written by older
/// code may lack any of them. Serialisation always writes every field so the
/// stored shape is explicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionInstrument {
  pub reference:   Option<String>,
  pub urn:         Option<String>,
  #[serde(rename = "type")]
  pub ci_type:     Option<String>,
  #[serde(rename = "surveyId")]
  pub survey_id:   Option<String>,
  /// Routing classifiers, e.g. `{"RU_REF": "01234567890"}`.
  pub classifiers: BTreeMap<String, String>,
  #[serde(rename = "$schema")]
  pub schema_tag:  Option<String>,
}

impl CollectionInstrument {
  /// The interpreted kind, if the `type` tag is one of the known kinds.
  pub fn kind(&self) -> Option<InstrumentKind> {
    self.ci_type.as_deref().and_then(InstrumentKind::from_tag)
  }

  /// Fill `urn` from `reference` when the caller did not supply one.
  pub fn with_derived_urn(mut self) -> Self {
    if self.urn.is_none()
      && let Some(reference) = self.reference.as_deref()
    {
      self.urn = Some(urn::instrument_urn(reference));
    }
    self
  }

  /// Stamp the current schema tag when none is present.
  pub fn with_current_schema(mut self) -> Self {
    if self.schema_tag.is_none() {
      self.schema_tag = Some(CURRENT_SCHEMA.to_owned());
    }
    self
  }
}

/// Accepts every known document shape, with the same tolerance as
/// [`codec::decode`].
impl<'de> Deserialize<'de> for CollectionInstrument {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let value = serde_json::Value::deserialize(deserializer)?;
    codec::from_value(value)
      .map(|(instrument, _)| instrument)
      .map_err(serde::de::Error::custom)
  }
}

// ─── Stored envelope ─────────────────────────────────────────────────────────

/// A decoded document together with the id of the row it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredInstrument {
  pub id:         InstrumentId,
  pub instrument: CollectionInstrument,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_is_case_insensitive() {
    assert_eq!(InstrumentKind::from_tag("OFFLINE"), Some(InstrumentKind::Offline));
    assert_eq!(InstrumentKind::from_tag("seft"), Some(InstrumentKind::Seft));
    assert_eq!(InstrumentKind::from_tag("eQ"), Some(InstrumentKind::Eq));
    assert_eq!(InstrumentKind::from_tag("ONLINE"), Some(InstrumentKind::Eq));
    assert_eq!(InstrumentKind::from_tag("spreadsheet"), None);
  }

  #[test]
  fn derived_urn_only_fills_missing() {
    let ci = CollectionInstrument {
      reference: Some("001.001.00002".into()),
      ..Default::default()
    }
    .with_derived_urn();
    assert_eq!(ci.urn.as_deref(), Some("urn:ons.gov.uk:id:ci:001.001.00002"));

    let ci = CollectionInstrument {
      reference: Some("001.001.00002".into()),
      urn: Some("urn:custom".into()),
      ..Default::default()
    }
    .with_derived_urn();
    assert_eq!(ci.urn.as_deref(), Some("urn:custom"));
  }

  #[test]
  fn current_schema_is_not_overwritten() {
    let ci = CollectionInstrument {
      schema_tag: Some("/schema/old".into()),
      ..Default::default()
    }
    .with_current_schema();
    assert_eq!(ci.schema_tag.as_deref(), Some("/schema/old"));
    assert_eq!(
      CollectionInstrument::default().with_current_schema().schema_tag.as_deref(),
      Some(CURRENT_SCHEMA)
    );
  }

  #[test]
  fn deserialize_accepts_legacy_type_key() {
    let ci: CollectionInstrument =
      serde_json::from_str(r#"{"reference":"r","ciType":"OFFLINE"}"#).unwrap();
    assert_eq!(ci.ci_type.as_deref(), Some("OFFLINE"));
    assert_eq!(ci.kind(), Some(InstrumentKind::Offline));
  }
}
