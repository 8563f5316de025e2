//! Small lookup tables loaded fully into memory for the duration of a run.

use std::{collections::HashMap, num::NonZeroU64};

use camino::Utf8Path;
use geonames_core::ExternalId;
use log::{info, warn};
use thiserror::Error;

use crate::tabular::{self, CountryInfoRecord, RecordError, TabularError};

/// Errors raised while loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The country-info file could not be opened.
    #[error(transparent)]
    Open(#[from] TabularError),
    /// Reading the country-info file failed part-way through.
    #[error("failed to read country info: {0}")]
    Read(RecordError),
}

/// The country-info table indexed by geonames identifier and ISO code.
#[derive(Debug, Clone, Default)]
pub struct CountryInfoTable {
    rows: Vec<CountryInfoRecord>,
    by_id: HashMap<ExternalId, usize>,
    by_iso: HashMap<String, usize>,
    malformed: u64,
}

impl CountryInfoTable {
    /// Parse `path`, skipping (and counting) malformed rows.
    pub fn load(path: &Utf8Path) -> Result<Self, ReferenceError> {
        let mut table = Self::default();
        for item in tabular::parse::<CountryInfoRecord>(path)? {
            match item {
                Ok(record) => table.insert(record),
                Err(RecordError::Malformed(err)) => {
                    warn!("Skipping country info row: {err}");
                    table.malformed += 1;
                }
                Err(err) => return Err(ReferenceError::Read(err)),
            }
        }
        info!(
            "Loaded {} countries from {path} ({} malformed rows)",
            table.len(),
            table.malformed
        );
        Ok(table)
    }

    /// Build a table from already decoded rows. A later row replaces every
    /// earlier row sharing its identifier or its ISO code.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = CountryInfoRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    fn insert(&mut self, record: CountryInfoRecord) {
        let collides =
            self.by_id.contains_key(&record.geoname_id) || self.by_iso.contains_key(&record.iso);
        if !collides {
            let index = self.rows.len();
            self.by_id.insert(record.geoname_id, index);
            self.by_iso.insert(record.iso.clone(), index);
            self.rows.push(record);
            return;
        }
        // The new row may collide with one row by id and another by ISO code;
        // both go.
        self.rows
            .retain(|row| row.geoname_id != record.geoname_id && row.iso != record.iso);
        self.rows.push(record);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_id.clear();
        self.by_iso.clear();
        for (index, row) in self.rows.iter().enumerate() {
            self.by_id.insert(row.geoname_id, index);
            self.by_iso.insert(row.iso.clone(), index);
        }
    }

    /// Look a country up by its geonames identifier.
    #[must_use]
    pub fn by_geoname_id(&self, id: ExternalId) -> Option<&CountryInfoRecord> {
        self.by_id.get(&id).and_then(|&index| self.rows.get(index))
    }

    /// Look a country up by its ISO 3166-1 alpha-2 code.
    #[must_use]
    pub fn by_iso(&self, iso: &str) -> Option<&CountryInfoRecord> {
        self.by_iso.get(iso).and_then(|&index| self.rows.get(index))
    }

    /// Whether `iso` names a known country.
    #[must_use]
    pub fn contains_iso(&self, iso: &str) -> bool {
        self.by_iso.contains_key(iso)
    }

    /// Rows in file order.
    pub fn iter(&self) -> impl Iterator<Item = &CountryInfoRecord> {
        self.rows.iter()
    }

    /// Number of countries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no countries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows skipped while loading.
    #[must_use]
    pub const fn malformed(&self) -> u64 {
        self.malformed
    }
}

/// A continent known to Geonames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continent {
    /// Two-letter code used by the country-info table.
    pub code: &'static str,
    /// English name.
    pub name: &'static str,
    /// Geonames identifier of the continent record.
    pub geoname_id: ExternalId,
}

const fn continent(code: &'static str, name: &'static str, id: u64) -> Continent {
    Continent {
        code,
        name,
        geoname_id: match NonZeroU64::new(id) {
            Some(id) => ExternalId::from_non_zero(id),
            None => panic!("continent identifiers are positive"),
        },
    }
}

const GEONAMES_CONTINENTS: [Continent; 7] = [
    continent("AF", "Africa", 6_255_146),
    continent("AS", "Asia", 6_255_147),
    continent("EU", "Europe", 6_255_148),
    continent("NA", "North America", 6_255_149),
    continent("OC", "Oceania", 6_255_151),
    continent("SA", "South America", 6_255_150),
    continent("AN", "Antarctica", 6_255_152),
];

/// The fixed continent table published by Geonames.
///
/// # Examples
/// ```
/// use geonames_data::reference::ContinentTable;
///
/// let continents = ContinentTable::geonames();
/// let europe = continents.by_code("EU").expect("Europe is listed");
/// assert_eq!(europe.geoname_id.get(), 6_255_148);
/// assert_eq!(continents.iter().count(), 7);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContinentTable {
    continents: &'static [Continent],
}

impl ContinentTable {
    /// The seven Geonames continents.
    #[must_use]
    pub const fn geonames() -> Self {
        Self {
            continents: &GEONAMES_CONTINENTS,
        }
    }

    /// Look a continent up by its two-letter code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&Continent> {
        self.continents.iter().find(|continent| continent.code == code)
    }

    /// Look a continent up by its geonames identifier.
    #[must_use]
    pub fn by_geoname_id(&self, id: ExternalId) -> Option<&Continent> {
        self.continents
            .iter()
            .find(|continent| continent.geoname_id == id)
    }

    /// Continents in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Continent> {
        self.continents.iter()
    }
}

impl Default for ContinentTable {
    fn default() -> Self {
        Self::geonames()
    }
}

/// Reference data shared by every mapper during one run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    /// Country-info rows.
    pub countries: CountryInfoTable,
    /// Continent codes and identifiers.
    pub continents: ContinentTable,
}

impl ReferenceTables {
    /// Bundle a loaded country-info table with the Geonames continents.
    #[must_use]
    pub const fn new(countries: CountryInfoTable) -> Self {
        Self {
            countries,
            continents: ContinentTable::geonames(),
        }
    }
}
