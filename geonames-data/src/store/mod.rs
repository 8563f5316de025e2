//! SQLite implementation of the [`GeoStore`](geonames_core::GeoStore) gateway.
//!
//! The module is split into two focused submodules:
//! - [`schema`] materialises one table per entity class and records the
//!   schema version.
//! - `sqlite` batches upserts and deletions into those tables.
#![forbid(unsafe_code)]

pub mod schema;
mod sqlite;

pub use schema::{SCHEMA_VERSION, StoreSchemaError, initialise_schema};
pub use sqlite::{SqliteGeoStore, SqliteStoreError};
