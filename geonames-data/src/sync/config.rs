//! Run configuration for the synchronisation engine.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::fetch::{CitiesThreshold, ResourceKind};

/// Dump streamed by the seed's place phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    /// Every geonames record.
    #[default]
    AllCountries,
    /// Only populated places above a population threshold.
    Cities(CitiesThreshold),
}

impl SeedSource {
    /// Resource fetched for this source.
    #[must_use]
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::AllCountries => ResourceKind::AllCountries,
            Self::Cities(threshold) => ResourceKind::Cities(threshold),
        }
    }
}

/// Error returned when a seed source name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown seed source {0:?}; expected all-countries, cities500, cities1000, cities5000 or cities15000"
)]
pub struct UnknownSeedSource(pub String);

impl FromStr for SeedSource {
    type Err = UnknownSeedSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_ascii_lowercase();
        if matches!(normalised.as_str(), "all-countries" | "allcountries" | "all") {
            return Ok(Self::AllCountries);
        }
        normalised
            .parse::<CitiesThreshold>()
            .map(Self::Cities)
            .map_err(|_| UnknownSeedSource(value.to_owned()))
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllCountries => f.write_str("all-countries"),
            Self::Cities(threshold) => f.write_str(threshold.stem()),
        }
    }
}

/// Explicit settings for one engine run.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use geonames_data::sync::{SeedSource, SyncConfig};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
/// let config = SyncConfig::new(date)
///     .with_seed_source("cities15000".parse().expect("known source"))
///     .with_languages(["en", "de"])
///     .without_translations();
/// assert!(!config.translations);
/// assert_eq!(config.languages, ["en", "de"]);
/// assert_ne!(config.seed_source, SeedSource::AllCountries);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Day whose delta files the daily update applies.
    pub date: NaiveDate,
    /// Dump streamed by the seed.
    pub seed_source: SeedSource,
    /// Whether translation phases run.
    pub translations: bool,
    /// Translation language allow-list; empty keeps every language.
    pub languages: Vec<String>,
    /// Population floor for cities.
    pub min_population: u64,
    /// Records between observer progress callbacks; zero disables them.
    pub progress_interval: u64,
}

impl SyncConfig {
    /// Records between progress callbacks unless configured otherwise.
    pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

    /// Defaults for a run applying the deltas published for `date`.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            seed_source: SeedSource::AllCountries,
            translations: true,
            languages: Vec::new(),
            min_population: 0,
            progress_interval: Self::DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Seed from `seed_source` instead of `allCountries`.
    #[must_use]
    pub const fn with_seed_source(mut self, seed_source: SeedSource) -> Self {
        self.seed_source = seed_source;
        self
    }

    /// Skip every translation phase.
    #[must_use]
    pub const fn without_translations(mut self) -> Self {
        self.translations = false;
        self
    }

    /// Keep only translations in these languages; an empty list keeps all.
    #[must_use]
    pub fn with_languages<I, L>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Drop cities with fewer inhabitants than `min_population`.
    #[must_use]
    pub const fn with_min_population(mut self, min_population: u64) -> Self {
        self.min_population = min_population;
        self
    }

    /// Records between progress callbacks.
    #[must_use]
    pub const fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }
}
