//! The document shapes found in stored rows.
//!
//! Rows are never migrated, so the decoder has to read every shape that has
//! ever been written. All shapes decode into the same flat
//! [`CollectionInstrument`](crate::CollectionInstrument); this module only
//! names the shapes and lists where each logical field may live.
//!
//! | Variant      | Reference key | URN key        | Type key          | Schema tag |
//! |--------------|---------------|----------------|-------------------|------------|
//! | `PublicId`   | `id`          | `urn`          | `type`            | no         |
//! | `UrnId`      | `reference`   | `id`           | `ciType`          | no         |
//! | `Untagged`   | `reference`   | `urn`          | `ciType`          | no         |
//! | `Tagged`     | `reference`   | `urn`          | `type` / `ciType` | `$schema`  |
//!
//! The legacy `id` key is shared: a string under it is a URN when it parses
//! as a collection instrument URN, and a reference otherwise.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::urn;

// ─── Field aliases ───────────────────────────────────────────────────────────

/// Key used by the oldest shapes for either the reference or the URN.
pub const LEGACY_ID_KEY: &str = "id";

/// Keys that may hold the business reference, in precedence order.
pub const REFERENCE_KEYS: &[&str] = &["reference", LEGACY_ID_KEY];
/// Keys that may hold the instrument URN, in precedence order.
pub const URN_KEYS: &[&str] = &["urn", LEGACY_ID_KEY];
pub const TYPE_KEYS: &[&str] = &["type", "ciType"];
pub const SURVEY_KEYS: &[&str] = &["surveyId"];
pub const CLASSIFIER_KEYS: &[&str] = &["classifiers"];
pub const SCHEMA_KEYS: &[&str] = &["$schema", "schemaTag"];

/// The first alias in `keys` whose value is a JSON string.
pub fn first_string<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
  keys.iter().find_map(|k| object.get(*k).and_then(Value::as_str))
}

/// Whether a string under [`LEGACY_ID_KEY`] is read as a URN.
pub fn legacy_id_is_urn(id: &str) -> bool {
  urn::validate(id, urn::INSTRUMENT).is_ok()
}

/// The business reference, honouring the split of the legacy `id` key.
pub fn reference(object: &Map<String, Value>) -> Option<&str> {
  resolve(object, REFERENCE_KEYS, false)
}

/// The instrument URN, honouring the split of the legacy `id` key.
pub fn instrument_urn(object: &Map<String, Value>) -> Option<&str> {
  resolve(object, URN_KEYS, true)
}

fn resolve<'a>(
  object:   &'a Map<String, Value>,
  keys:     &[&str],
  want_urn: bool,
) -> Option<&'a str> {
  keys.iter().find_map(|k| {
    let value = object.get(*k).and_then(Value::as_str)?;
    (*k != LEGACY_ID_KEY || legacy_id_is_urn(value) == want_urn).then_some(value)
  })
}

// ─── Variants ────────────────────────────────────────────────────────────────

/// A known historical document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
  /// The earliest shape: the public reference lives under `id`, and
  /// `classifiers` may be a free-form string.
  PublicId,
  /// The instrument URN lives under `id`, next to an optional `reference`.
  UrnId,
  /// `reference`/`urn`/`ciType` documents written before schema tagging.
  Untagged,
  /// Documents carrying a schema tag; the current shape.
  Tagged,
}

impl SchemaVariant {
  pub fn detect(object: &Map<String, Value>) -> Self {
    if first_string(object, SCHEMA_KEYS).is_some() {
      return SchemaVariant::Tagged;
    }

    let legacy_id = object.get(LEGACY_ID_KEY).and_then(Value::as_str);
    if legacy_id.is_some_and(legacy_id_is_urn) {
      return SchemaVariant::UrnId;
    }

    let reference_under_id =
      !object.get("reference").is_some_and(Value::is_string) && legacy_id.is_some();
    let dsl_classifiers = object.get("classifiers").is_some_and(Value::is_string);

    if reference_under_id || dsl_classifiers || object.contains_key("link") {
      SchemaVariant::PublicId
    } else {
      SchemaVariant::Untagged
    }
  }
}
