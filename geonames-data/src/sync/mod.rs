//! Seed and daily-update orchestration.
//!
//! [`SyncEngine`] composes a [`Fetcher`](crate::fetch::Fetcher), a
//! [`GeoStore`](geonames_core::GeoStore) and a [`SyncConfig`]. Each run loads
//! the reference tables, then streams one resource per phase through the
//! mappers into the store, flushing the store when a phase completes. Upserts
//! overwrite and deletes of absent rows are no-ops, so replaying a day's
//! deltas converges to the same state.

mod config;
mod engine;
mod error;
mod observer;
mod report;

pub use config::{SeedSource, SyncConfig, UnknownSeedSource};
pub use engine::SyncEngine;
pub use error::SyncError;
pub use observer::{LogObserver, NoopObserver, SyncObserver};
pub use report::{Phase, PhaseCounts, PhaseReport, SyncReport};

#[cfg(test)]
mod tests;
