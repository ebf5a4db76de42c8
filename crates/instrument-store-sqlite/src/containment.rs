//! Containment predicates over the JSON `content` column.
//!
//! A containment filter matches rows whose stored document is a structural
//! superset of a partial fragment: every key in the fragment must be present
//! with an equal value, and any other keys are ignored.
//!
//! Caller-supplied values never appear in predicate text. Every value, and
//! every JSON path built from a caller-supplied key, is passed as a bound `?`
//! parameter; the predicate itself only contains fixed SQL.

use instrument_core::variant::{self, LEGACY_ID_KEY, REFERENCE_KEYS, URN_KEYS};
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A `WHERE`-clause fragment plus the parameters for its `?` placeholders,
/// in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainmentFilter {
  predicate: String,
  params:    Vec<SqlValue>,
}

impl ContainmentFilter {
  /// Filter for documents containing every key/value pair of `fragment`,
  /// which must be a JSON object. `{}` matches every row.
  ///
  /// Nested objects are matched recursively. Arrays are not supported, and
  /// keys containing `"` cannot be expressed as a JSON path.
  pub fn for_fragment(fragment: &Value) -> Result<Self> {
    let Value::Object(object) = fragment else {
      return Err(Error::InvalidFragment("fragment must be a JSON object".into()));
    };

    let mut builder = Builder::default();
    builder.object("$", object)?;
    Ok(builder.finish())
  }

  pub fn predicate(&self) -> &str { &self.predicate }

  pub fn params(&self) -> &[SqlValue] { &self.params }
}

/// Filter for documents whose business reference is exactly `reference`.
///
/// The reference is read from the same aliases, in the same order, as the
/// decoder uses. Older rows keep the reference under `id`, unless that `id`
/// is a URN. Callers still compare the decoded reference, since SQLite and
/// the decoder disagree on objects with repeated keys.
pub fn build_reference_filter(reference: &str) -> ContainmentFilter {
  alias_filter(REFERENCE_KEYS, reference, variant::legacy_id_is_urn(reference))
}

/// Filter for documents whose instrument URN is exactly `urn`, either under
/// `urn` or, for the oldest rows, under `id`.
pub fn build_urn_filter(urn: &str) -> ContainmentFilter {
  alias_filter(URN_KEYS, urn, !variant::legacy_id_is_urn(urn))
}

/// One alternative per alias in `keys`; each requires every earlier alias to
/// be absent or not a string. With `skip_legacy_id` the `id` alternative is
/// left out, because an `id` holding `value` would decode to the other field.
fn alias_filter(keys: &[&str], value: &str, skip_legacy_id: bool) -> ContainmentFilter {
  let mut alternatives = Vec::with_capacity(keys.len());
  let mut params = Vec::with_capacity(keys.len());

  for (i, key) in keys.iter().enumerate() {
    if skip_legacy_id && *key == LEGACY_ID_KEY {
      continue;
    }
    // Alias keys are compile-time constants, so their paths may be inlined.
    let mut conds: Vec<String> = keys[..i]
      .iter()
      .map(|earlier| {
        format!("COALESCE(json_type(content, '{}'), '') <> 'text'", child_path("$", earlier))
      })
      .collect();
    let path = child_path("$", key);
    conds.push(format!(
      "json_type(content, '{path}') = 'text' AND json_extract(content, '{path}') = ?"
    ));

    alternatives.push(format!("({})", conds.join(" AND ")));
    params.push(SqlValue::Text(value.to_owned()));
  }

  ContainmentFilter {
    predicate: format!("({})", alternatives.join(" OR ")),
    params,
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Builder {
  clauses: Vec<String>,
  params:  Vec<SqlValue>,
}

impl Builder {
  fn object(&mut self, path: &str, object: &Map<String, Value>) -> Result<()> {
    if object.is_empty() && path != "$" {
      self.type_is(path, "object");
      return Ok(());
    }

    for (key, value) in object {
      if key.is_empty() || key.contains('"') {
        return Err(Error::InvalidFragment(format!(
          "key {key:?} cannot be used in a containment query"
        )));
      }
      let child = child_path(path, key);

      match value {
        Value::Object(inner) => self.object(&child, inner)?,
        Value::String(s) => {
          self.equals(&child, "json_type(content, ?) = 'text'", SqlValue::Text(s.clone()));
        }
        Value::Number(n) => {
          let bound = match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
          };
          self.equals(&child, "json_type(content, ?) IN ('integer', 'real')", bound);
        }
        Value::Bool(b) => self.type_is(&child, if *b { "true" } else { "false" }),
        Value::Null => self.type_is(&child, "null"),
        Value::Array(_) => {
          return Err(Error::InvalidFragment(format!(
            "array containment is not supported (at {child})"
          )));
        }
      }
    }
    Ok(())
  }

  fn type_is(&mut self, path: &str, json_type: &str) {
    self.clauses.push("json_type(content, ?) = ?".to_owned());
    self.params.push(SqlValue::Text(path.to_owned()));
    self.params.push(SqlValue::Text(json_type.to_owned()));
  }

  /// `type_check` must contain exactly one `?`, for the path.
  fn equals(&mut self, path: &str, type_check: &str, value: SqlValue) {
    self
      .clauses
      .push(format!("{type_check} AND json_extract(content, ?) = ?"));
    self.params.push(SqlValue::Text(path.to_owned()));
    self.params.push(SqlValue::Text(path.to_owned()));
    self.params.push(value);
  }

  fn finish(self) -> ContainmentFilter {
    let predicate = if self.clauses.is_empty() {
      "1".to_owned()
    } else {
      self
        .clauses
        .iter()
        .map(|c| format!("({c})"))
        .collect::<Vec<_>>()
        .join(" AND ")
    };
    ContainmentFilter { predicate, params: self.params }
  }
}

/// SQLite JSON path of `key` under `parent`. Plain identifiers are written
/// bare so the path matches the expression index; other keys are quoted.
fn child_path(parent: &str, key: &str) -> String {
  let plain = key
    .chars()
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
  if plain {
    format!("{parent}.{key}")
  } else {
    format!("{parent}.\"{key}\"")
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn placeholders(filter: &ContainmentFilter) -> usize {
    filter.predicate().matches('?').count()
  }

  #[test]
  fn reference_is_bound_not_interpolated() {
    let hostile = r#"x"}') OR 1=1 --"#;
    let filter = build_reference_filter(hostile);
    assert!(!filter.predicate().contains(hostile));
    assert!(!filter.predicate().contains("OR 1=1"));
    assert_eq!(placeholders(&filter), filter.params().len());
    assert!(
      filter
        .params()
        .iter()
        .all(|p| *p == SqlValue::Text(hostile.to_owned()))
    );
  }

  #[test]
  fn reference_filter_covers_every_alias() {
    let filter = build_reference_filter("X1");
    assert_eq!(filter.params().len(), REFERENCE_KEYS.len());
    assert!(filter.predicate().contains("json_extract(content, '$.reference') = ?"));
    assert!(filter.predicate().contains("json_extract(content, '$.id') = ?"));
  }

  #[test]
  fn legacy_id_alternative_follows_urn_shape() {
    let urn = "urn:ons.gov.uk:id:ci:001.001.00002";

    let by_reference = build_reference_filter(urn);
    assert_eq!(by_reference.params().len(), 1);
    assert!(!by_reference.predicate().contains("json_extract(content, '$.id')"));

    let by_urn = build_urn_filter(urn);
    assert_eq!(by_urn.params().len(), 2);
    assert!(by_urn.predicate().contains("COALESCE(json_type(content, '$.urn'), '') <> 'text'"));
    assert!(by_urn.predicate().contains("json_extract(content, '$.id') = ?"));

    let not_a_urn = build_urn_filter("urn:custom");
    assert_eq!(not_a_urn.params().len(), 1);
    assert_eq!(placeholders(&not_a_urn), 1);
  }

  #[test]
  fn fragment_binds_paths_and_values() {
    let filter = ContainmentFilter::for_fragment(&json!({
      "classifiers": {"RU_REF": "01234567890"}
    }))
    .unwrap();
    assert_eq!(
      filter.predicate(),
      "(json_type(content, ?) = 'text' AND json_extract(content, ?) = ?)"
    );
    assert_eq!(
      filter.params(),
      &[
        SqlValue::Text("$.classifiers.RU_REF".into()),
        SqlValue::Text("$.classifiers.RU_REF".into()),
        SqlValue::Text("01234567890".into()),
      ]
    );
  }

  #[test]
  fn fragment_quotes_unusual_keys() {
    let filter = ContainmentFilter::for_fragment(&json!({"$schema": "/x", "a b": true})).unwrap();
    assert!(filter.params().contains(&SqlValue::Text("$.\"$schema\"".into())));
    assert!(filter.params().contains(&SqlValue::Text("$.\"a b\"".into())));
    assert_eq!(placeholders(&filter), filter.params().len());
  }

  #[test]
  fn empty_fragment_matches_everything() {
    let filter = ContainmentFilter::for_fragment(&json!({})).unwrap();
    assert_eq!(filter.predicate(), "1");
    assert!(filter.params().is_empty());
  }

  #[test]
  fn empty_nested_object_requires_an_object() {
    let filter = ContainmentFilter::for_fragment(&json!({"classifiers": {}})).unwrap();
    assert_eq!(filter.predicate(), "(json_type(content, ?) = ?)");
    assert_eq!(
      filter.params(),
      &[SqlValue::Text("$.classifiers".into()), SqlValue::Text("object".into())]
    );
  }

  #[test]
  fn rejects_unsupported_fragments() {
    assert!(matches!(
      ContainmentFilter::for_fragment(&json!("reference")),
      Err(Error::InvalidFragment(_))
    ));
    assert!(matches!(
      ContainmentFilter::for_fragment(&json!({"tags": ["a"]})),
      Err(Error::InvalidFragment(_))
    ));
    assert!(matches!(
      ContainmentFilter::for_fragment(&json!({"a\"b": 1})),
      Err(Error::InvalidFragment(_))
    ));
  }
}
