//! Filtering and attribute mapping of parsed records.
//!
//! A [`RecordMapper`] decides whether a record belongs to its entity class and
//! turns accepted records into [`EntityAttributes`]. Rejection is not an
//! error: records nobody accepts are counted as filtered by the engine.

use geonames_core::{EntityAttributes, EntityClass, ExternalId};

use crate::reference::ReferenceTables;
use crate::tabular::{AlternateNameRecord, GeoRecord};

mod places;
mod translation;

pub use places::{CityMapper, ContinentMapper, CountryMapper, DivisionMapper};
pub use translation::{PSEUDO_LANGUAGES, TranslationMapper};

#[cfg(test)]
mod tests;

/// Records keyed by an external identifier.
pub trait Keyed {
    /// Identifier the mapped row is stored under.
    fn external_id(&self) -> ExternalId;
}

impl Keyed for GeoRecord {
    fn external_id(&self) -> ExternalId {
        self.geoname_id
    }
}

impl Keyed for AlternateNameRecord {
    fn external_id(&self) -> ExternalId {
        self.alternate_name_id
    }
}

/// Filter and attribute mapping for one entity class.
pub trait RecordMapper<R> {
    /// Entity class produced by this mapper.
    fn entity_class(&self) -> EntityClass;

    /// Whether `record` belongs to this mapper's entity class.
    fn accepts(&self, record: &R) -> bool;

    /// Attributes for `record`.
    ///
    /// Returns `Some` for every record [`accepts`](Self::accepts) passed.
    fn to_attributes(&self, record: &R) -> Option<EntityAttributes>;

    /// Filter then map `record`.
    fn map(&self, record: &R) -> Option<EntityAttributes> {
        if self.accepts(record) {
            self.to_attributes(record)
        } else {
            None
        }
    }
}

/// The main-format mappers, tried in dependency order.
///
/// Feature codes accepted by the mappers are disjoint, so at most one mapper
/// accepts any record.
#[derive(Debug, Clone)]
pub struct MapperSet<'a> {
    continents: ContinentMapper<'a>,
    countries: CountryMapper<'a>,
    divisions: DivisionMapper<'a>,
    cities: CityMapper<'a>,
}

impl<'a> MapperSet<'a> {
    /// Build every main-format mapper over `references`.
    #[must_use]
    pub const fn new(references: &'a ReferenceTables, min_population: u64) -> Self {
        Self {
            continents: ContinentMapper::new(&references.continents),
            countries: CountryMapper::new(references),
            divisions: DivisionMapper::new(&references.countries),
            cities: CityMapper::new(&references.countries, min_population),
        }
    }

    /// The country mapper, used to supply countries from reference data.
    #[must_use]
    pub const fn countries(&self) -> &CountryMapper<'a> {
        &self.countries
    }

    /// First mapper accepting `record`.
    #[must_use]
    pub fn route(&self, record: &GeoRecord) -> Option<&dyn RecordMapper<GeoRecord>> {
        let mappers: [&dyn RecordMapper<GeoRecord>; 4] = [
            &self.continents,
            &self.countries,
            &self.divisions,
            &self.cities,
        ];
        mappers.into_iter().find(|mapper| mapper.accepts(record))
    }

    /// Map `record` with the first accepting mapper.
    #[must_use]
    pub fn map(&self, record: &GeoRecord) -> Option<EntityAttributes> {
        self.route(record)
            .and_then(|mapper| mapper.to_attributes(record))
    }
}
