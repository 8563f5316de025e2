use geonames_core::{
    CityAttributes, ContinentAttributes, CountryAttributes, DivisionAttributes, EntityAttributes,
    EntityClass, PlaceDetails,
};

use super::RecordMapper;
use crate::reference::{ContinentTable, CountryInfoTable, ReferenceTables};
use crate::tabular::{CountryInfoRecord, GeoRecord};

const CONTINENT_CODE: &str = "CONT";
const COUNTRY_CODES: &[&str] = &["PCLI", "PCLD", "TERR", "PCLIX", "PCLS", "PCLF", "PCL"];
const DIVISION_CODE: &str = "ADM1";
const CITY_CLASS: &str = "P";
const CITY_CODES: &[&str] = &[
    "PPL", "PPLA", "PPLA2", "PPLA3", "PPLA4", "PPLC", "PPLG", "PPLS",
];

fn place(record: &GeoRecord) -> PlaceDetails {
    PlaceDetails {
        latitude: record.latitude,
        longitude: record.longitude,
        timezone_id: record.timezone.clone(),
        population: record.population,
        elevation: record.elevation,
        dem: record.dem,
        feature_code: record.feature_code.clone(),
        synced_at: record.modified_at,
    }
}

fn official_name(record: &GeoRecord) -> String {
    record
        .ascii_name
        .clone()
        .unwrap_or_else(|| record.name.clone())
}

/// Maps `CONT` records listed in the continent table.
#[derive(Debug, Clone, Copy)]
pub struct ContinentMapper<'a> {
    continents: &'a ContinentTable,
}

impl<'a> ContinentMapper<'a> {
    #[must_use]
    pub const fn new(continents: &'a ContinentTable) -> Self {
        Self { continents }
    }
}

impl RecordMapper<GeoRecord> for ContinentMapper<'_> {
    fn entity_class(&self) -> EntityClass {
        EntityClass::Continent
    }

    fn accepts(&self, record: &GeoRecord) -> bool {
        record.feature_code == CONTINENT_CODE
            && self.continents.by_geoname_id(record.geoname_id).is_some()
    }

    fn to_attributes(&self, record: &GeoRecord) -> Option<EntityAttributes> {
        let continent = self.continents.by_geoname_id(record.geoname_id)?;
        Some(EntityAttributes::Continent(ContinentAttributes {
            code: continent.code.to_owned(),
            name: record.name.clone(),
            place: place(record),
        }))
    }
}

/// Maps political entities listed in the country-info table.
#[derive(Debug, Clone, Copy)]
pub struct CountryMapper<'a> {
    references: &'a ReferenceTables,
}

impl<'a> CountryMapper<'a> {
    #[must_use]
    pub const fn new(references: &'a ReferenceTables) -> Self {
        Self { references }
    }

    /// Attributes for a country known only from its country-info row.
    #[must_use]
    pub fn supply(&self, info: &CountryInfoRecord) -> EntityAttributes {
        EntityAttributes::Country(Box::new(self.from_info(info, None)))
    }

    fn from_info(&self, info: &CountryInfoRecord, record: Option<&GeoRecord>) -> CountryAttributes {
        CountryAttributes {
            code: info.iso.clone(),
            iso3: info.iso3.clone(),
            iso_numeric: info.iso_numeric,
            name: info.name.clone(),
            name_official: record.map(official_name),
            continent_id: self
                .references
                .continents
                .by_code(&info.continent)
                .map(|continent| continent.geoname_id),
            capital: info.capital.clone(),
            currency_code: info.currency_code.clone(),
            currency_name: info.currency_name.clone(),
            tld: info.tld.clone(),
            phone_code: info.phone.clone(),
            postal_code_format: info.postal_code_format.clone(),
            postal_code_regex: info.postal_code_regex.clone(),
            languages: info.languages.clone(),
            neighbours: info.neighbours.clone(),
            area: info.area,
            fips: info.fips.clone(),
            place: record.map(place),
        }
    }
}

impl RecordMapper<GeoRecord> for CountryMapper<'_> {
    fn entity_class(&self) -> EntityClass {
        EntityClass::Country
    }

    fn accepts(&self, record: &GeoRecord) -> bool {
        COUNTRY_CODES.contains(&record.feature_code.as_str())
            && self
                .references
                .countries
                .by_geoname_id(record.geoname_id)
                .is_some()
    }

    fn to_attributes(&self, record: &GeoRecord) -> Option<EntityAttributes> {
        let info = self.references.countries.by_geoname_id(record.geoname_id)?;
        Some(EntityAttributes::Country(Box::new(
            self.from_info(info, Some(record)),
        )))
    }
}

/// Maps first-order administrative divisions of known countries.
#[derive(Debug, Clone, Copy)]
pub struct DivisionMapper<'a> {
    countries: &'a CountryInfoTable,
}

impl<'a> DivisionMapper<'a> {
    #[must_use]
    pub const fn new(countries: &'a CountryInfoTable) -> Self {
        Self { countries }
    }
}

impl RecordMapper<GeoRecord> for DivisionMapper<'_> {
    fn entity_class(&self) -> EntityClass {
        EntityClass::Division
    }

    fn accepts(&self, record: &GeoRecord) -> bool {
        record.feature_code == DIVISION_CODE && self.countries.contains_iso(&record.country_code)
    }

    fn to_attributes(&self, record: &GeoRecord) -> Option<EntityAttributes> {
        Some(EntityAttributes::Division(DivisionAttributes {
            name: record.name.clone(),
            name_official: official_name(record),
            country_code: record.country_code.clone(),
            admin1_code: record.admin1_code.clone(),
            place: place(record),
        }))
    }
}

/// Maps populated places of known countries above a population floor.
#[derive(Debug, Clone, Copy)]
pub struct CityMapper<'a> {
    countries: &'a CountryInfoTable,
    min_population: u64,
}

impl<'a> CityMapper<'a> {
    /// Accept cities with at least `min_population` inhabitants. Cities with
    /// an unknown population only pass when the floor is zero.
    #[must_use]
    pub const fn new(countries: &'a CountryInfoTable, min_population: u64) -> Self {
        Self {
            countries,
            min_population,
        }
    }
}

impl RecordMapper<GeoRecord> for CityMapper<'_> {
    fn entity_class(&self) -> EntityClass {
        EntityClass::City
    }

    fn accepts(&self, record: &GeoRecord) -> bool {
        record.feature_class == CITY_CLASS
            && CITY_CODES.contains(&record.feature_code.as_str())
            && record.population.unwrap_or(0) >= self.min_population
            && self.countries.contains_iso(&record.country_code)
    }

    fn to_attributes(&self, record: &GeoRecord) -> Option<EntityAttributes> {
        Some(EntityAttributes::City(CityAttributes {
            name: record.name.clone(),
            name_official: official_name(record),
            country_code: record.country_code.clone(),
            admin1_code: record.admin1_code.clone(),
            admin2_code: record.admin2_code.clone(),
            place: place(record),
        }))
    }
}
