//! Geonames ingestion pipeline.
//!
//! Responsibilities:
//! - Fetch dump and delta files from the Geonames endpoint (`fetch`).
//! - Stream the tab-separated formats into typed records (`tabular`).
//! - Load the country and continent reference tables (`reference`).
//! - Filter and map records into entity attributes (`mapper`).
//! - Sequence seeds and daily updates against a gateway (`sync`).
//! - Provide the SQLite gateway (`store`).
//!
//! Boundaries:
//! - Domain types and the gateway trait live in `geonames-core`.
//! - Network I/O is async; parsing and SQLite writes block the engine's task.
//!
//! Invariants:
//! - No global mutable state; every collaborator is passed in explicitly.
//! - Upserts overwrite and deletions of absent rows are no-ops, so replaying
//!   a day's deltas converges to the same state.

pub mod fetch;
pub mod mapper;
pub mod reference;
pub mod store;
pub mod sync;
pub mod tabular;
