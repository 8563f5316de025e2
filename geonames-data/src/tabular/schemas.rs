//! Record types for each Geonames file format.

use chrono::NaiveDate;
use geonames_core::ExternalId;

use super::{FieldError, Fields, TabularSchema};

/// A line of the main geonames format (`allCountries`, `citiesN`,
/// `modifications-*`).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    /// Geonames identifier.
    pub geoname_id: ExternalId,
    /// Name in the local script.
    pub name: String,
    /// Name in plain ASCII.
    pub ascii_name: Option<String>,
    /// Comma separated alternate names, ASCII only.
    pub alternate_names: Option<String>,
    /// Latitude in decimal degrees (WGS84).
    pub latitude: f64,
    /// Longitude in decimal degrees (WGS84).
    pub longitude: f64,
    /// Feature class, such as `P` or `A`.
    pub feature_class: String,
    /// Feature code, such as `PPLC` or `PCLI`.
    pub feature_code: String,
    /// ISO 3166 country code.
    pub country_code: String,
    /// Alternate country codes, comma separated.
    pub cc2: Option<String>,
    /// First-level administrative code.
    pub admin1_code: Option<String>,
    /// Second-level administrative code.
    pub admin2_code: Option<String>,
    /// Third-level administrative code.
    pub admin3_code: Option<String>,
    /// Fourth-level administrative code.
    pub admin4_code: Option<String>,
    /// Number of inhabitants.
    pub population: Option<u64>,
    /// Elevation in metres.
    pub elevation: Option<i32>,
    /// Digital elevation model height in metres.
    pub dem: Option<i32>,
    /// IANA timezone identifier.
    pub timezone: Option<String>,
    /// Date of the last upstream modification.
    pub modified_at: Option<NaiveDate>,
}

impl TabularSchema for GeoRecord {
    const NAME: &'static str = "geonames";
    const COLUMNS: &'static [&'static str] = &[
        "geonameid",
        "name",
        "asciiname",
        "alternatenames",
        "latitude",
        "longitude",
        "feature class",
        "feature code",
        "country code",
        "cc2",
        "admin1 code",
        "admin2 code",
        "admin3 code",
        "admin4 code",
        "population",
        "elevation",
        "dem",
        "timezone",
        "modification date",
    ];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            geoname_id: fields.id(0)?,
            name: fields.string(1),
            ascii_name: fields.optional_string(2),
            alternate_names: fields.optional_string(3),
            latitude: fields.required(4)?,
            longitude: fields.required(5)?,
            feature_class: fields.string(6),
            feature_code: fields.string(7),
            country_code: fields.string(8),
            cc2: fields.optional_string(9),
            admin1_code: fields.optional_string(10),
            admin2_code: fields.optional_string(11),
            admin3_code: fields.optional_string(12),
            admin4_code: fields.optional_string(13),
            population: fields.optional(14)?,
            elevation: fields.optional(15)?,
            dem: fields.optional(16)?,
            timezone: fields.optional_string(17),
            modified_at: fields.date(18)?,
        })
    }
}

/// A line of `deletes-*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRecord {
    /// Identifier of the deleted record.
    pub geoname_id: ExternalId,
    /// Name of the record when it was deleted.
    pub name: Option<String>,
    /// Reason given for the deletion.
    pub comment: Option<String>,
}

impl TabularSchema for DeletionRecord {
    const NAME: &'static str = "geonames deletes";
    const COLUMNS: &'static [&'static str] = &["geonameid", "name", "comment"];
    const MIN_FIELDS: usize = 1;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            geoname_id: fields.id(0)?,
            name: fields.optional_string(1),
            comment: fields.optional_string(2),
        })
    }
}

/// A line of `alternateNamesV2` or `alternateNamesModifications-*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateNameRecord {
    /// Alternate-name identifier.
    pub alternate_name_id: ExternalId,
    /// Geonames identifier of the named place.
    pub geoname_id: ExternalId,
    /// ISO 639 language code or a pseudo-language such as `post`.
    pub language: String,
    /// The alternate name.
    pub name: String,
    /// Whether this is the preferred name in its language.
    pub is_preferred: bool,
    /// Whether this is a short form.
    pub is_short: bool,
    /// Whether this is a colloquial form.
    pub is_colloquial: bool,
    /// Whether this name is historic.
    pub is_historic: bool,
    /// Start of the period the name was used in.
    pub from: Option<String>,
    /// End of the period the name was used in.
    pub to: Option<String>,
}

impl TabularSchema for AlternateNameRecord {
    const NAME: &'static str = "alternate names";
    const COLUMNS: &'static [&'static str] = &[
        "alternateNameId",
        "geonameid",
        "isolanguage",
        "alternate name",
        "isPreferredName",
        "isShortName",
        "isColloquial",
        "isHistoric",
        "from",
        "to",
    ];
    const MIN_FIELDS: usize = 8;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            alternate_name_id: fields.id(0)?,
            geoname_id: fields.id(1)?,
            language: fields.string(2),
            name: fields.string(3),
            is_preferred: fields.flag(4)?,
            is_short: fields.flag(5)?,
            is_colloquial: fields.flag(6)?,
            is_historic: fields.flag(7)?,
            from: fields.optional_string(8),
            to: fields.optional_string(9),
        })
    }
}

/// A line of `alternateNamesDeletes-*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateNameDeletionRecord {
    /// Identifier of the deleted alternate name.
    pub alternate_name_id: ExternalId,
    /// Geonames identifier of the place, when given.
    pub geoname_id: Option<ExternalId>,
    /// Reason given for the deletion.
    pub comment: Option<String>,
}

impl TabularSchema for AlternateNameDeletionRecord {
    const NAME: &'static str = "alternate name deletes";
    const COLUMNS: &'static [&'static str] = &["alternateNameId", "geonameid", "comment"];
    const MIN_FIELDS: usize = 1;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            alternate_name_id: fields.id(0)?,
            geoname_id: fields.optional(1)?,
            comment: fields.optional_string(2),
        })
    }
}

/// A row of `countryInfo.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryInfoRecord {
    /// ISO 3166 alpha-2 code.
    pub iso: String,
    /// ISO 3166 alpha-3 code.
    pub iso3: String,
    /// ISO 3166 numeric code.
    pub iso_numeric: Option<u16>,
    /// FIPS 10-4 code.
    pub fips: Option<String>,
    /// English country name.
    pub name: String,
    /// Name of the capital.
    pub capital: Option<String>,
    /// Area in square kilometres.
    pub area: Option<f64>,
    /// Number of inhabitants.
    pub population: Option<u64>,
    /// Two-letter continent code.
    pub continent: String,
    /// Top-level domain, including the leading dot.
    pub tld: Option<String>,
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
    /// Currency name.
    pub currency_name: Option<String>,
    /// International dialling prefix.
    pub phone: Option<String>,
    /// Postal code format.
    pub postal_code_format: Option<String>,
    /// Postal code regular expression.
    pub postal_code_regex: Option<String>,
    /// Comma separated language tags.
    pub languages: Option<String>,
    /// Geonames identifier of the country.
    pub geoname_id: ExternalId,
    /// ISO codes of bordering countries, comma separated.
    pub neighbours: Option<String>,
    /// Equivalent FIPS code.
    pub equivalent_fips_code: Option<String>,
}

impl TabularSchema for CountryInfoRecord {
    const NAME: &'static str = "country info";
    const COLUMNS: &'static [&'static str] = &[
        "ISO",
        "ISO3",
        "ISO-Numeric",
        "fips",
        "Country",
        "Capital",
        "Area(in sq km)",
        "Population",
        "Continent",
        "tld",
        "CurrencyCode",
        "CurrencyName",
        "Phone",
        "Postal Code Format",
        "Postal Code Regex",
        "Languages",
        "geonameid",
        "neighbours",
        "EquivalentFipsCode",
    ];
    // Rows may omit the trailing neighbour columns.
    const MIN_FIELDS: usize = 17;
    const COMMENT_PREFIX: Option<&'static str> = Some("#");

    fn from_fields(fields: &Fields<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            iso: fields.required(0)?,
            iso3: fields.string(1),
            iso_numeric: fields.optional(2)?,
            fips: fields.optional_string(3),
            name: fields.required(4)?,
            capital: fields.optional_string(5),
            area: fields.optional(6)?,
            population: fields.optional(7)?,
            continent: fields.string(8),
            tld: fields.optional_string(9),
            currency_code: fields.optional_string(10),
            currency_name: fields.optional_string(11),
            phone: fields.optional_string(12),
            postal_code_format: fields.optional_string(13),
            postal_code_regex: fields.optional_string(14),
            languages: fields.optional_string(15),
            geoname_id: fields.id(16)?,
            neighbours: fields.optional_string(17),
            equivalent_fips_code: fields.optional_string(18),
        })
    }
}
