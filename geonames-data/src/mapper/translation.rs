use std::collections::BTreeSet;

use geonames_core::{EntityAttributes, EntityClass, TranslationAttributes};

use super::RecordMapper;
use crate::tabular::AlternateNameRecord;

/// Language column values that tag codes and links rather than names.
pub const PSEUDO_LANGUAGES: &[&str] = &[
    "post", "iata", "icao", "faac", "fr_1793", "abbr", "link", "wkdt", "unlc", "tcid",
];

/// Maps alternate names into translations.
///
/// # Examples
/// ```
/// use geonames_data::mapper::{RecordMapper, TranslationMapper};
/// use geonames_data::tabular::AlternateNameRecord;
///
/// # fn main() -> Result<(), geonames_core::ExternalIdError> {
/// let record = AlternateNameRecord {
///     alternate_name_id: "1".parse()?,
///     geoname_id: "2950159".parse()?,
///     language: "iata".into(),
///     name: "BER".into(),
///     is_preferred: false,
///     is_short: false,
///     is_colloquial: false,
///     is_historic: false,
///     from: None,
///     to: None,
/// };
/// assert!(!TranslationMapper::new().accepts(&record));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranslationMapper {
    languages: Option<BTreeSet<String>>,
}

impl TranslationMapper {
    /// Accept every real language.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept names in `languages`. An empty list keeps every language.
    #[must_use]
    pub fn with_languages<I, L>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let allowed: BTreeSet<String> = languages
            .into_iter()
            .map(|language| language.as_ref().trim().to_owned())
            .filter(|language| !language.is_empty())
            .collect();
        self.languages = (!allowed.is_empty()).then_some(allowed);
        self
    }
}

impl RecordMapper<AlternateNameRecord> for TranslationMapper {
    fn entity_class(&self) -> EntityClass {
        EntityClass::Translation
    }

    fn accepts(&self, record: &AlternateNameRecord) -> bool {
        let language = record.language.as_str();
        if language.is_empty() || record.name.is_empty() {
            return false;
        }
        if PSEUDO_LANGUAGES.contains(&language) {
            return false;
        }
        self.languages
            .as_ref()
            .is_none_or(|allowed| allowed.contains(language))
    }

    fn to_attributes(&self, record: &AlternateNameRecord) -> Option<EntityAttributes> {
        Some(EntityAttributes::Translation(TranslationAttributes {
            geoname_id: record.geoname_id,
            language: record.language.clone(),
            name: record.name.clone(),
            is_preferred: record.is_preferred,
            is_short: record.is_short,
            is_colloquial: record.is_colloquial,
            is_historic: record.is_historic,
        }))
    }
}
