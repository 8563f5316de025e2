//! Test-only, in-memory `GeoStore` implementation used by unit and behaviour
//! tests.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::{
    EntityAttributes, EntityClass, ExternalId, GeoStore, PersistenceError, PersistenceOperation,
};

/// In-memory [`GeoStore`] keeping one ordered map per entity class.
///
/// Rows are compared by value, so two stores can be checked for identical
/// state with `==`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryGeoStore {
    rows: BTreeMap<EntityClass, BTreeMap<ExternalId, EntityAttributes>>,
    failing_ids: BTreeSet<ExternalId>,
    flushes: usize,
}

/// Error raised by [`MemoryGeoStore`] for identifiers registered with
/// [`MemoryGeoStore::fail_on`].
#[derive(Debug, Error)]
#[error("injected failure for identifier {id}")]
pub struct InjectedFailure {
    /// Identifier that triggered the failure.
    pub id: ExternalId,
}

impl MemoryGeoStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write touching `id` fail with [`InjectedFailure`].
    #[must_use]
    pub fn fail_on(mut self, id: ExternalId) -> Self {
        self.failing_ids.insert(id);
        self
    }

    /// Fetch a stored row.
    #[must_use]
    pub fn get(&self, class: EntityClass, id: ExternalId) -> Option<&EntityAttributes> {
        self.rows.get(&class).and_then(|rows| rows.get(&id))
    }

    /// Number of rows stored for `class`.
    #[must_use]
    pub fn len(&self, class: EntityClass) -> usize {
        self.rows.get(&class).map_or(0, BTreeMap::len)
    }

    /// Total number of rows across every class.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Identifiers stored for `class` in ascending order.
    #[must_use]
    pub fn ids(&self, class: EntityClass) -> Vec<ExternalId> {
        self.rows
            .get(&class)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of times [`GeoStore::flush`] was called.
    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    /// Compare row contents only, ignoring flush counters and injected
    /// failures.
    #[must_use]
    pub fn same_rows(&self, other: &Self) -> bool {
        let non_empty = |store: &Self| {
            store
                .rows
                .iter()
                .filter(|(_, rows)| !rows.is_empty())
                .map(|(class, rows)| (*class, rows.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        non_empty(self) == non_empty(other)
    }

    fn check(
        &self,
        operation: PersistenceOperation,
        class: EntityClass,
        id: ExternalId,
    ) -> Result<(), PersistenceError> {
        if self.failing_ids.contains(&id) {
            return Err(PersistenceError::new(operation, class, InjectedFailure { id }).with_id(id));
        }
        Ok(())
    }
}

impl GeoStore for MemoryGeoStore {
    fn upsert(
        &mut self,
        id: ExternalId,
        attributes: &EntityAttributes,
    ) -> Result<(), PersistenceError> {
        let class = attributes.class();
        self.check(PersistenceOperation::Upsert, class, id)?;
        self.rows
            .entry(class)
            .or_default()
            .insert(id, attributes.clone());
        Ok(())
    }

    fn delete_by_external_id(
        &mut self,
        class: EntityClass,
        id: ExternalId,
    ) -> Result<bool, PersistenceError> {
        self.check(PersistenceOperation::Delete, class, id)?;
        Ok(self
            .rows
            .get_mut(&class)
            .is_some_and(|rows| rows.remove(&id).is_some()))
    }

    fn has_any_rows(&self, class: EntityClass) -> Result<bool, PersistenceError> {
        Ok(self.len(class) > 0)
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranslationAttributes;
    use rstest::{fixture, rstest};

    fn id(raw: u64) -> ExternalId {
        ExternalId::new(raw).expect("test identifiers are positive")
    }

    #[fixture]
    fn translation() -> EntityAttributes {
        EntityAttributes::Translation(TranslationAttributes {
            geoname_id: id(2_950_159),
            language: "en".into(),
            name: "Berlin".into(),
            is_preferred: true,
            is_short: false,
            is_colloquial: false,
            is_historic: false,
        })
    }

    #[rstest]
    fn upsert_overwrites_existing_rows(translation: EntityAttributes) {
        let mut store = MemoryGeoStore::new();
        store.upsert(id(1), &translation).expect("first upsert");
        let EntityAttributes::Translation(mut changed) = translation else {
            panic!("fixture is a translation");
        };
        changed.name = "Berlin (city)".into();
        let changed = EntityAttributes::Translation(changed);
        store.upsert(id(1), &changed).expect("second upsert");

        assert_eq!(store.len(EntityClass::Translation), 1);
        assert_eq!(store.get(EntityClass::Translation, id(1)), Some(&changed));
    }

    #[rstest]
    fn deleting_absent_rows_is_a_no_op() {
        let mut store = MemoryGeoStore::new();
        let removed = store
            .delete_by_external_id(EntityClass::City, id(42))
            .expect("delete should succeed");
        assert!(!removed);
        assert_eq!(store.total(), 0);
    }

    #[rstest]
    fn injected_failures_surface_as_persistence_errors(translation: EntityAttributes) {
        let mut store = MemoryGeoStore::new().fail_on(id(7));
        let err = store
            .upsert(id(7), &translation)
            .expect_err("upsert should fail");
        assert_eq!(err.operation, PersistenceOperation::Upsert);
        assert_eq!(err.class, EntityClass::Translation);
        assert_eq!(err.id, Some(id(7)));
        assert!(err.to_string().contains("translation 7"), "{err}");
    }

    #[rstest]
    fn same_rows_ignores_flush_counters(translation: EntityAttributes) {
        let mut left = MemoryGeoStore::new();
        let mut right = MemoryGeoStore::new();
        left.upsert(id(3), &translation).expect("upsert left");
        right.upsert(id(3), &translation).expect("upsert right");
        right.flush().expect("flush");
        assert!(left.same_rows(&right));
        assert_ne!(left, right);
    }
}
