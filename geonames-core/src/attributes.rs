//! Typed attribute sets written through the [`GeoStore`](crate::GeoStore).
//!
//! Each entity class has a fixed struct so mappers and storage backends agree
//! on field names at compile time. Optional columns are `Option`; an empty
//! upstream value always maps to `None`, never to zero.

use chrono::NaiveDate;

use crate::{EntityClass, ExternalId};

/// Location and provenance fields shared by every geonames-backed entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceDetails {
    /// WGS84 latitude in decimal degrees.
    pub latitude: f64,
    /// WGS84 longitude in decimal degrees.
    pub longitude: f64,
    /// IANA timezone identifier.
    pub timezone_id: Option<String>,
    /// Population reported upstream.
    pub population: Option<u64>,
    /// Elevation in metres.
    pub elevation: Option<i32>,
    /// Digital elevation model value in metres.
    pub dem: Option<i32>,
    /// Geonames feature code (for example `PPLC`).
    pub feature_code: String,
    /// Upstream modification date of the record.
    pub synced_at: Option<NaiveDate>,
}

/// Attributes persisted for a continent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinentAttributes {
    /// Two-letter continent code (`EU`, `AF`, ...).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Location and provenance.
    pub place: PlaceDetails,
}

/// Attributes persisted for a country.
///
/// Countries supplied from the country-info table alone have no
/// [`PlaceDetails`] until a geonames record for them is applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CountryAttributes {
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    /// ISO 3166-1 alpha-3 code.
    pub iso3: String,
    /// ISO 3166-1 numeric code.
    pub iso_numeric: Option<u16>,
    /// Common English name from the country-info table.
    pub name: String,
    /// Official name taken from the geonames record.
    pub name_official: Option<String>,
    /// Geonames identifier of the continent the country belongs to.
    pub continent_id: Option<ExternalId>,
    /// Capital city name.
    pub capital: Option<String>,
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
    /// Currency display name.
    pub currency_name: Option<String>,
    /// Top-level domain, including the leading dot.
    pub tld: Option<String>,
    /// International dialling prefix.
    pub phone_code: Option<String>,
    /// Postal code format mask.
    pub postal_code_format: Option<String>,
    /// Postal code validation expression.
    pub postal_code_regex: Option<String>,
    /// Comma separated language tags.
    pub languages: Option<String>,
    /// Comma separated ISO codes of neighbouring countries.
    pub neighbours: Option<String>,
    /// Area in square kilometres.
    pub area: Option<f64>,
    /// FIPS 10-4 code.
    pub fips: Option<String>,
    /// Location and provenance, when known.
    pub place: Option<PlaceDetails>,
}

/// Attributes persisted for a first-order administrative division.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DivisionAttributes {
    /// Native name.
    pub name: String,
    /// ASCII transliteration, falling back to the native name.
    pub name_official: String,
    /// ISO code of the owning country.
    pub country_code: String,
    /// Geonames admin1 code.
    pub admin1_code: Option<String>,
    /// Location and provenance.
    pub place: PlaceDetails,
}

/// Attributes persisted for a city.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CityAttributes {
    /// Native name.
    pub name: String,
    /// ASCII transliteration, falling back to the native name.
    pub name_official: String,
    /// ISO code of the owning country.
    pub country_code: String,
    /// Geonames admin1 code.
    pub admin1_code: Option<String>,
    /// Geonames admin2 code.
    pub admin2_code: Option<String>,
    /// Location and provenance.
    pub place: PlaceDetails,
}

/// Attributes persisted for an alternate name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TranslationAttributes {
    /// Geonames entity the name annotates.
    pub geoname_id: ExternalId,
    /// ISO 639 language code.
    pub language: String,
    /// Translated name.
    pub name: String,
    /// Official or preferred name in the language.
    pub is_preferred: bool,
    /// Short form (`California` rather than `State of California`).
    pub is_short: bool,
    /// Colloquial or slang term.
    pub is_colloquial: bool,
    /// Historic name no longer in use.
    pub is_historic: bool,
}

/// Attribute set tagged with its entity class.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityAttributes {
    /// Continent row.
    Continent(ContinentAttributes),
    /// Country row.
    Country(Box<CountryAttributes>),
    /// Division row.
    Division(DivisionAttributes),
    /// City row.
    City(CityAttributes),
    /// Translation row.
    Translation(TranslationAttributes),
}

impl EntityAttributes {
    /// Entity class the attributes belong to.
    ///
    /// # Examples
    ///
    /// ```
    /// use geonames_core::{EntityAttributes, EntityClass, ExternalId, TranslationAttributes};
    ///
    /// # fn main() -> Result<(), geonames_core::ExternalIdError> {
    /// let attributes = EntityAttributes::Translation(TranslationAttributes {
    ///     geoname_id: ExternalId::new(2_950_159)?,
    ///     language: "de".into(),
    ///     name: "Berlin".into(),
    ///     is_preferred: true,
    ///     is_short: false,
    ///     is_colloquial: false,
    ///     is_historic: false,
    /// });
    /// assert_eq!(attributes.class(), EntityClass::Translation);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub const fn class(&self) -> EntityClass {
        match self {
            Self::Continent(_) => EntityClass::Continent,
            Self::Country(_) => EntityClass::Country,
            Self::Division(_) => EntityClass::Division,
            Self::City(_) => EntityClass::City,
            Self::Translation(_) => EntityClass::Translation,
        }
    }
}
