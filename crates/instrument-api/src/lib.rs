//! JSON HTTP API for the collection instrument repository.
//!
//! Exposes an axum [`Router`] backed by any
//! [`instrument_core::store::InstrumentStore`]. Handlers only translate
//! between HTTP and the store; auth and TLS are the deployment's concern.

pub mod error;
pub mod instruments;
pub mod status;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use chrono::{DateTime, Utc};
use instrument_core::store::InstrumentStore;
use instrument_store_sqlite::StoreOptions;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `INSTRUMENT_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub store:      StoreOptions,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: InstrumentStore> {
  pub store:      Arc<S>,
  pub started_at: DateTime<Utc>,
}

impl<S: InstrumentStore> AppState<S> {
  pub fn new(store: S) -> Self {
    Self {
      store:      Arc::new(store),
      started_at: Utc::now(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: InstrumentStore + Clone + 'static,
{
  Router::new()
    .route("/status", get(status::handler::<S>))
    .route("/schema/collectioninstrument", get(status::schema))
    .route(
      "/collectioninstrument",
      get(instruments::list::<S>).post(instruments::create::<S>),
    )
    .route(
      "/collectioninstrument/id/{id}",
      get(instruments::get_by_id::<S>).put(instruments::replace::<S>),
    )
    .route("/collectioninstrument/urn/{urn}", get(instruments::get_by_urn::<S>))
    .route(
      "/collectioninstrument/surveyid/{survey_id}",
      get(instruments::by_survey::<S>),
    )
    .route(
      "/collectioninstrument/{reference}",
      get(instruments::get_by_reference::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
