//! Core types and trait definitions for the collection instrument repository.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::InstrumentStore`]; transport layers
//! depend on the trait, not on any concrete backend.

pub mod codec;
pub mod error;
pub mod instrument;
pub mod store;
pub mod urn;
pub mod variant;

pub use error::{Error, Result};
pub use instrument::{CollectionInstrument, InstrumentId, InstrumentKind, StoredInstrument};
