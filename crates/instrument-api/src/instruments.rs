//! Handlers for `/collectioninstrument` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/collectioninstrument` | Optional `?classifier={json}` and `?type=<kind>` filters; `[]` when empty |
//! | `POST` | `/collectioninstrument` | Body: any known document shape; returns 201 + `{"id":n}` |
//! | `GET`  | `/collectioninstrument/{reference}` | 404 if no document carries the reference |
//! | `GET`  | `/collectioninstrument/id/{id}` | 404 if not found |
//! | `PUT`  | `/collectioninstrument/id/{id}` | Full replacement; 204, or 404 if not found |
//! | `GET`  | `/collectioninstrument/urn/{urn}` | 400 on a malformed URN |
//! | `GET`  | `/collectioninstrument/surveyid/{survey_id}` | Optional `?classifier={json}`; 400 on a malformed survey URN |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use instrument_core::{
  CollectionInstrument, InstrumentId, InstrumentKind, StoredInstrument,
  store::InstrumentStore, urn,
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError};

const CLASSIFIER_HINT: &str =
  r#"classifier must be a JSON object of strings, e.g. ?classifier={"LEGAL_STATUS":"A","INDUSTRY":"B"}"#;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// JSON object; only documents carrying all of these classifiers match.
  pub classifier: Option<String>,
  /// Restrict to one instrument kind (case-insensitive).
  #[serde(rename = "type")]
  pub ci_type:    Option<String>,
}

/// `GET /collectioninstrument[?classifier={...}][&type=<kind>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoredInstrument>>, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  let kind = params
    .ci_type
    .as_deref()
    .map(|t| {
      InstrumentKind::from_tag(t)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown instrument type {t:?}")))
    })
    .transpose()?;

  let mut instruments = match params.classifier.as_deref() {
    Some(raw) => {
      let classifiers = parse_classifiers(raw)?;
      tracing::debug!(?classifiers, "searching collection instruments by classifier");
      state
        .store
        .find_containing(&json!({ "classifiers": classifiers }))
        .await
        .map_err(ApiError::from_store)?
    }
    None => state.store.list().await.map_err(ApiError::from_store)?,
  };

  if let Some(kind) = kind {
    instruments.retain(|s| s.instrument.kind() == Some(kind));
  }

  Ok(Json(instruments))
}

fn parse_classifiers(raw: &str) -> Result<BTreeMap<String, String>, ApiError> {
  serde_json::from_str(raw).map_err(|_| ApiError::BadRequest(CLASSIFIER_HINT.to_owned()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /collectioninstrument`
///
/// Responds 201 with a `Location` header and the assigned id.
///
/// Documents without a schema tag are stamped with the current one, and a
/// missing `urn` is derived from `reference`.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CollectionInstrument>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  let instrument = body.with_current_schema().with_derived_urn();
  let id = state
    .store
    .create(instrument)
    .await
    .map_err(ApiError::from_store)?;

  tracing::debug!(%id, "created collection instrument");
  Ok((
    StatusCode::CREATED,
    [(header::LOCATION, format!("/collectioninstrument/id/{id}"))],
    Json(json!({ "id": id })),
  ))
}

// ─── Replace ──────────────────────────────────────────────────────────────────

/// `PUT /collectioninstrument/id/{id}`: replaces the whole document.
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Json(body): Json<CollectionInstrument>,
) -> Result<StatusCode, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  state
    .store
    .replace(InstrumentId(id), body.with_current_schema())
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /collectioninstrument/id/{id}`
pub async fn get_by_id<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<StoredInstrument>, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  let found = state
    .store
    .read_by_id(InstrumentId(id))
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("collection instrument {id} not found")))?;
  Ok(Json(found))
}

/// `GET /collectioninstrument/{reference}`
pub async fn get_by_reference<S>(
  State(state): State<AppState<S>>,
  Path(reference): Path<String>,
) -> Result<Json<StoredInstrument>, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  let found = state
    .store
    .read_by_reference(&reference)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no collection instrument with reference {reference:?}"))
    })?;
  Ok(Json(found))
}

/// `GET /collectioninstrument/urn/{urn}`: the lowest-id document with this
/// URN.
pub async fn get_by_urn<S>(
  State(state): State<AppState<S>>,
  Path(urn): Path<String>,
) -> Result<Json<StoredInstrument>, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  urn::validate(&urn, urn::INSTRUMENT)
    .map_err(|e| ApiError::BadRequest(format!("invalid urn {urn:?}: {e}")))?;

  let found = state
    .store
    .find_by_urn(&urn)
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .next()
    .ok_or_else(|| ApiError::NotFound(format!("no collection instrument with urn {urn:?}")))?;
  Ok(Json(found))
}

// ─── Survey ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SurveyParams {
  /// JSON object of classifiers that must also match.
  pub classifier: Option<String>,
}

/// `GET /collectioninstrument/surveyid/{survey_id}[?classifier={...}]`
///
/// Every document for the survey, ordered by id; `[]` when there are none.
pub async fn by_survey<S>(
  State(state): State<AppState<S>>,
  Path(survey_id): Path<String>,
  Query(params): Query<SurveyParams>,
) -> Result<Json<Vec<StoredInstrument>>, ApiError>
where
  S: InstrumentStore + Clone + 'static,
{
  urn::validate(&survey_id, urn::SURVEY)
    .map_err(|e| ApiError::BadRequest(format!("invalid survey id {survey_id:?}: {e}")))?;

  let mut fragment = json!({ "surveyId": survey_id });
  if let Some(raw) = params.classifier.as_deref() {
    fragment["classifiers"] = json!(parse_classifiers(raw)?);
  }
  tracing::debug!(%fragment, "searching collection instruments by survey");

  let instruments = state
    .store
    .find_containing(&fragment)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(instruments))
}
