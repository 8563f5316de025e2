//! Persistence gateway used by the synchronisation engine.
//!
//! The [`GeoStore`] trait is the only view the engine has of the target
//! database. Implementations must make [`GeoStore::upsert`] a full overwrite
//! keyed by external identifier and [`GeoStore::delete_by_external_id`] a
//! no-op for absent rows, so replaying a delta converges to the same state.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::{EntityAttributes, EntityClass, ExternalId};

/// Write and readiness operations the engine needs from a store.
pub trait GeoStore {
    /// Insert the row, or overwrite every mapped attribute of an existing row.
    fn upsert(
        &mut self,
        id: ExternalId,
        attributes: &EntityAttributes,
    ) -> Result<(), PersistenceError>;

    /// Remove the row identified by `id`.
    ///
    /// Returns whether a row was removed; an absent row is not an error.
    fn delete_by_external_id(
        &mut self,
        class: EntityClass,
        id: ExternalId,
    ) -> Result<bool, PersistenceError>;

    /// Report whether any row of `class` exists.
    fn has_any_rows(&self, class: EntityClass) -> Result<bool, PersistenceError>;

    /// Make pending writes durable. Called at the end of every write phase.
    fn flush(&mut self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

impl<T: GeoStore + ?Sized> GeoStore for &mut T {
    fn upsert(
        &mut self,
        id: ExternalId,
        attributes: &EntityAttributes,
    ) -> Result<(), PersistenceError> {
        (**self).upsert(id, attributes)
    }

    fn delete_by_external_id(
        &mut self,
        class: EntityClass,
        id: ExternalId,
    ) -> Result<bool, PersistenceError> {
        (**self).delete_by_external_id(class, id)
    }

    fn has_any_rows(&self, class: EntityClass) -> Result<bool, PersistenceError> {
        (**self).has_any_rows(class)
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        (**self).flush()
    }
}

/// Gateway operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOperation {
    /// [`GeoStore::upsert`].
    Upsert,
    /// [`GeoStore::delete_by_external_id`].
    Delete,
    /// [`GeoStore::has_any_rows`].
    Inspect,
    /// [`GeoStore::flush`].
    Flush,
}

impl fmt::Display for PersistenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
            Self::Inspect => "inspect",
            Self::Flush => "flush",
        })
    }
}

/// Failure reported by a [`GeoStore`] backend.
#[derive(Debug, Error)]
#[error(
    "failed to {operation} {class}{}: {source}",
    .id.map(|id| format!(" {id}")).unwrap_or_default()
)]
pub struct PersistenceError {
    /// Operation that failed.
    pub operation: PersistenceOperation,
    /// Entity class being written or inspected.
    pub class: EntityClass,
    /// Identifier of the affected row, when the operation targets one.
    pub id: Option<ExternalId>,
    /// Backend error.
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl PersistenceError {
    /// Wrap a backend error raised while running `operation` on `class`.
    pub fn new(
        operation: PersistenceOperation,
        class: EntityClass,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            class,
            id: None,
            source: source.into(),
        }
    }

    /// Attach the identifier of the affected row.
    #[must_use]
    pub fn with_id(mut self, id: ExternalId) -> Self {
        self.id = Some(id);
        self
    }
}
