//! Service status and the published document schema.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use instrument_core::{instrument::CURRENT_SCHEMA, store::InstrumentStore};
use serde::Serialize;
use serde_json::{Value, json};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Status {
  pub name:     &'static str,
  pub version:  &'static str,
  pub status:   &'static str,
  pub up_since: DateTime<Utc>,
}

/// `GET /status`
pub async fn handler<S>(State(state): State<AppState<S>>) -> Json<Status>
where
  S: InstrumentStore + Clone + 'static,
{
  Json(Status {
    name:     env!("CARGO_PKG_NAME"),
    version:  env!("CARGO_PKG_VERSION"),
    status:   "UP",
    up_since: state.started_at,
  })
}

/// `GET /schema/collectioninstrument`: JSON Schema of the shape new
/// documents are written in. Older shapes are still accepted on input.
pub async fn schema() -> Json<Value> {
  let optional_string = json!({ "type": ["string", "null"] });
  Json(json!({
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$id": CURRENT_SCHEMA,
    "title": "Collection instrument",
    "type": "object",
    "properties": {
      "reference": optional_string,
      "urn": optional_string,
      "type": {
        "type": ["string", "null"],
        "examples": ["questionnaire", "offline", "eQ", "SEFT"]
      },
      "surveyId": optional_string,
      "classifiers": {
        "type": "object",
        "additionalProperties": { "type": "string" }
      },
      "$schema": optional_string
    }
  }))
}
