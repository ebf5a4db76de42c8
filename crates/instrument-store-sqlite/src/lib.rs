//! SQLite backend for the collection instrument repository.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each document lives as JSON text in a
//! single `content` column and is queried with SQLite's JSON functions.

mod encode;
mod schema;
mod store;

pub mod containment;
pub mod error;
pub mod options;

pub use containment::{ContainmentFilter, build_reference_filter, build_urn_filter};
pub use error::{Error, Result};
pub use options::{DuplicateReferencePolicy, StoreOptions};
pub use store::SqliteStore;
