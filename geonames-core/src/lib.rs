//! Core domain types for the Geonames synchronisation engine.
//!
//! The crate owns the vocabulary shared by the data pipeline and the storage
//! backends: external identifiers, entity classes, the typed attribute sets
//! produced by record mapping, and the [`GeoStore`] persistence gateway.
//! Constructors return `Result` to surface invalid input early.

#![forbid(unsafe_code)]

use std::{
    fmt,
    num::{NonZeroU64, ParseIntError},
    str::FromStr,
};

use thiserror::Error;

mod attributes;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use attributes::{
    CityAttributes, ContinentAttributes, CountryAttributes, DivisionAttributes, EntityAttributes,
    PlaceDetails, TranslationAttributes,
};
pub use store::{GeoStore, PersistenceError, PersistenceOperation};

/// Stable numeric identifier assigned by the upstream Geonames dataset.
///
/// Geonames identifiers are strictly positive; zero is rejected so a
/// defaulted column can never masquerade as a real entity.
///
/// # Examples
///
/// ```
/// use geonames_core::ExternalId;
///
/// # fn main() -> Result<(), geonames_core::ExternalIdError> {
/// let id: ExternalId = "2950159".parse()?;
/// assert_eq!(id.get(), 2_950_159);
/// assert!("".parse::<ExternalId>().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ExternalId(u64);

/// Errors returned when parsing an [`ExternalId`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExternalIdError {
    /// The identifier column was empty.
    #[error("external identifier is empty")]
    Empty,
    /// The identifier was not an unsigned integer.
    #[error("external identifier {value:?} is not numeric")]
    NotNumeric {
        /// Raw column value.
        value: String,
        /// Integer parsing failure.
        #[source]
        source: ParseIntError,
    },
    /// The identifier was zero.
    #[error("external identifier must be positive")]
    Zero,
}

impl ExternalId {
    /// Wrap a raw identifier, rejecting zero.
    pub const fn new(value: u64) -> Result<Self, ExternalIdError> {
        if value == 0 {
            Err(ExternalIdError::Zero)
        } else {
            Ok(Self(value))
        }
    }

    /// Wrap an identifier already known to be positive.
    #[must_use]
    pub const fn from_non_zero(value: NonZeroU64) -> Self {
        Self(value.get())
    }

    /// Return the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for ExternalId {
    type Err = ExternalIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExternalIdError::Empty);
        }
        let value = trimmed
            .parse::<u64>()
            .map_err(|source| ExternalIdError::NotNumeric {
                value: trimmed.to_owned(),
                source,
            })?;
        Self::new(value)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of entity the engine keeps in sync.
///
/// Continents, countries, divisions and cities share the geonames identifier
/// space; translations are keyed by alternate-name identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum EntityClass {
    /// Continents (feature code `CONT`).
    Continent,
    /// Independent and dependent political entities.
    Country,
    /// First-order administrative divisions.
    Division,
    /// Populated places.
    City,
    /// Alternate names attached to a geonames entity.
    Translation,
}

impl EntityClass {
    /// Entity classes keyed by the geonames identifier, in dependency order.
    pub const GEONAMES: [Self; 4] = [Self::Continent, Self::Country, Self::Division, Self::City];

    /// Human readable singular label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Continent => "continent",
            Self::Country => "country",
            Self::Division => "division",
            Self::City => "city",
            Self::Translation => "translation",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("123", 123)]
    #[case(" 6255146 ", 6_255_146)]
    fn parses_numeric_identifiers(#[case] raw: &str, #[case] expected: u64) {
        let id: ExternalId = raw.parse().expect("identifier should parse");
        assert_eq!(id.get(), expected);
    }

    #[rstest]
    fn rejects_empty_identifier() {
        assert_eq!("  ".parse::<ExternalId>(), Err(ExternalIdError::Empty));
    }

    #[rstest]
    #[case("12a")]
    #[case("-4")]
    #[case("1.5")]
    fn rejects_non_numeric_identifiers(#[case] raw: &str) {
        let err = raw.parse::<ExternalId>().expect_err("identifier should be rejected");
        assert!(matches!(err, ExternalIdError::NotNumeric { .. }), "{err:?}");
    }

    #[rstest]
    fn rejects_zero() {
        assert_eq!("0".parse::<ExternalId>(), Err(ExternalIdError::Zero));
    }

    #[rstest]
    fn geonames_classes_exclude_translations() {
        assert!(!EntityClass::GEONAMES.contains(&EntityClass::Translation));
        assert_eq!(EntityClass::City.to_string(), "city");
    }
}
