//! Encoding and decoding between [`CollectionInstrument`] and the JSON text
//! stored in the `content` column.
//!
//! Encoding writes the current shape with every field present. Decoding
//! accepts every shape listed in [`crate::variant`]: unknown keys are
//! ignored, missing keys decode to `None` or an empty map, and the only
//! failure is text that is not a JSON object.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
  CollectionInstrument, Error, Result,
  variant::{
    self, CLASSIFIER_KEYS, SCHEMA_KEYS, SURVEY_KEYS, SchemaVariant, TYPE_KEYS, first_string,
  },
};

pub fn encode(instrument: &CollectionInstrument) -> Result<String> {
  serde_json::to_string(instrument).map_err(Error::Encoding)
}

pub fn decode(text: &str) -> Result<CollectionInstrument> {
  decode_with_variant(text).map(|(instrument, _)| instrument)
}

/// Decode, also reporting which historical shape the text was written in.
pub fn decode_with_variant(text: &str) -> Result<(CollectionInstrument, SchemaVariant)> {
  let value: Value = serde_json::from_str(text).map_err(Error::MalformedContent)?;
  from_value(value)
}

pub fn from_value(value: Value) -> Result<(CollectionInstrument, SchemaVariant)> {
  let object = match value {
    Value::Object(object) => object,
    other => return Err(Error::NotAnObject(json_type_name(&other))),
  };

  let variant = SchemaVariant::detect(&object);
  let field = |keys: &[&str]| first_string(&object, keys).map(str::to_owned);

  let instrument = CollectionInstrument {
    reference:   variant::reference(&object).map(str::to_owned),
    urn:         variant::instrument_urn(&object).map(str::to_owned),
    ci_type:     field(TYPE_KEYS),
    survey_id:   field(SURVEY_KEYS),
    classifiers: decode_classifiers(&object),
    schema_tag:  field(SCHEMA_KEYS),
  };

  Ok((instrument, variant))
}

/// Object-valued classifiers keep string values and stringify numbers and
/// booleans. Anything else, including the old free-form string form, yields
/// an empty map.
fn decode_classifiers(object: &Map<String, Value>) -> BTreeMap<String, String> {
  let Some(Value::Object(map)) = CLASSIFIER_KEYS.iter().find_map(|k| object.get(*k)) else {
    return BTreeMap::new();
  };

  map
    .iter()
    .filter_map(|(k, v)| {
      let value = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
      };
      Some((k.clone(), value))
    })
    .collect()
}

fn json_type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
