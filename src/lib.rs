//! Facade crate for the Geonames synchronisation engine.
//!
//! This crate re-exports the core domain types and exposes the download, sync
//! and SQLite store pipeline behind feature flags.

#![forbid(unsafe_code)]

pub use geonames_core::{
    CityAttributes, ContinentAttributes, CountryAttributes, DivisionAttributes, EntityAttributes,
    EntityClass, ExternalId, ExternalIdError, GeoStore, PersistenceError, PersistenceOperation,
    PlaceDetails, TranslationAttributes,
};

#[cfg(feature = "pipeline")]
pub use geonames_data::fetch::{CachePolicy, Fetcher, HttpResourceSource, ResourceFetcher};
#[cfg(feature = "pipeline")]
pub use geonames_data::sync::{
    LogObserver, Phase, PhaseCounts, SeedSource, SyncConfig, SyncEngine, SyncError, SyncReport,
};

#[cfg(feature = "store-sqlite")]
pub use geonames_data::store::{SqliteGeoStore, SqliteStoreError};
