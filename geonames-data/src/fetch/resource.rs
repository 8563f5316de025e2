//! Resource kinds published by the Geonames dump endpoint, and the URL
//! newtypes used to address them.

use std::{fmt, ops::Deref, str::FromStr, time::Duration};

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::FetchError;

/// Default Geonames dump endpoint.
pub const DEFAULT_BASE_URL: &str = "https://download.geonames.org/export/dump";

/// Population thresholds of the pre-filtered `citiesN` dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CitiesThreshold {
    /// `cities500`
    Cities500,
    /// `cities1000`
    Cities1000,
    /// `cities5000`
    Cities5000,
    /// `cities15000`
    Cities15000,
}

impl CitiesThreshold {
    /// Stem of the published file name.
    #[must_use]
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Cities500 => "cities500",
            Self::Cities1000 => "cities1000",
            Self::Cities5000 => "cities5000",
            Self::Cities15000 => "cities15000",
        }
    }
}

/// Error returned when a cities threshold name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cities dump {0:?}; expected cities500, cities1000, cities5000 or cities15000")]
pub struct UnknownThreshold(pub String);

impl FromStr for CitiesThreshold {
    type Err = UnknownThreshold;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cities500" => Ok(Self::Cities500),
            "cities1000" => Ok(Self::Cities1000),
            "cities5000" => Ok(Self::Cities5000),
            "cities15000" => Ok(Self::Cities15000),
            _ => Err(UnknownThreshold(value.to_owned())),
        }
    }
}

/// A file published by the Geonames dump endpoint.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use geonames_data::fetch::ResourceKind;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
/// let kind = ResourceKind::DailyDeletes(date);
/// assert_eq!(kind.remote_name(), "deletes-2024-03-09.txt");
/// assert!(!kind.is_archive());
/// assert_eq!(ResourceKind::AllCountries.local_name(), "allCountries.txt");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ResourceKind {
    /// Every geonames record, zipped.
    AllCountries,
    /// Populated places above a population threshold, zipped.
    Cities(CitiesThreshold),
    /// Country reference table.
    CountryInfo,
    /// Every alternate name, zipped.
    AlternateNames,
    /// Records modified on the given day.
    DailyModifications(NaiveDate),
    /// Records deleted on the given day.
    DailyDeletes(NaiveDate),
    /// Alternate names modified on the given day.
    DailyAlternateNamesModifications(NaiveDate),
    /// Alternate names deleted on the given day.
    DailyAlternateNamesDeletes(NaiveDate),
}

impl ResourceKind {
    /// Name of the file on the remote endpoint.
    #[must_use]
    pub fn remote_name(&self) -> String {
        if self.is_archive() {
            format!("{}.zip", self.stem())
        } else {
            self.local_name()
        }
    }

    /// Name of the plain-text file materialised in the working directory.
    #[must_use]
    pub fn local_name(&self) -> String {
        format!("{}.txt", self.stem())
    }

    /// Whether the remote file is a zip archive that must be unpacked.
    #[must_use]
    pub const fn is_archive(&self) -> bool {
        matches!(
            self,
            Self::AllCountries | Self::Cities(_) | Self::AlternateNames
        )
    }

    /// Whether the resource is a daily delta file.
    #[must_use]
    pub const fn is_delta(&self) -> bool {
        matches!(
            self,
            Self::DailyModifications(_)
                | Self::DailyDeletes(_)
                | Self::DailyAlternateNamesModifications(_)
                | Self::DailyAlternateNamesDeletes(_)
        )
    }

    /// Resolve the remote URL beneath `base`.
    pub fn url(&self, base: &BaseUrl) -> Result<ResourceUrl, FetchError> {
        let name = self.remote_name();
        let joined = format!("{base}/{name}");
        Url::parse(&joined)
            .map(ResourceUrl::from)
            .map_err(|source| FetchError::Url {
                base: base.to_string(),
                name,
                source,
            })
    }

    fn stem(&self) -> String {
        match self {
            Self::AllCountries => "allCountries".to_owned(),
            Self::Cities(threshold) => threshold.stem().to_owned(),
            Self::CountryInfo => "countryInfo".to_owned(),
            Self::AlternateNames => "alternateNamesV2".to_owned(),
            Self::DailyModifications(date) => format!("modifications-{date}"),
            Self::DailyDeletes(date) => format!("deletes-{date}"),
            Self::DailyAlternateNamesModifications(date) => {
                format!("alternateNamesModifications-{date}")
            }
            Self::DailyAlternateNamesDeletes(date) => format!("alternateNamesDeletes-{date}"),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remote_name())
    }
}

/// Base URL of the dump endpoint, without a trailing slash.
///
/// # Examples
/// ```
/// # use geonames_data::fetch::BaseUrl;
/// let url = BaseUrl::new("https://download.geonames.org/export/dump/");
/// assert_eq!(url.as_ref(), "https://download.geonames.org/export/dump");
/// assert_eq!(BaseUrl::new("").as_ref(), geonames_data::fetch::DEFAULT_BASE_URL);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Trim trailing slashes, falling back to [`DEFAULT_BASE_URL`] when empty.
    pub fn new(value: impl Into<String>) -> Self {
        let raw = value.into();
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            Self(DEFAULT_BASE_URL.to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self(DEFAULT_BASE_URL.to_owned())
    }
}

impl From<&str> for BaseUrl {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified URL of a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrl(String);

impl ResourceUrl {
    /// Final path segment of the URL.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl From<Url> for ResourceUrl {
    fn from(value: Url) -> Self {
        Self(value.into())
    }
}

impl AsRef<str> for ResourceUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ResourceUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// When a previously fetched file may be reused instead of downloaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Reuse any non-empty local copy.
    #[default]
    Reuse,
    /// Reuse local copies modified no longer ago than the given age.
    MaxAge(Duration),
    /// Always download.
    Refresh,
}

/// A resource materialised as a plain-text file in the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedResource {
    /// Resource that was fetched.
    pub kind: ResourceKind,
    /// Location of the plain-text file.
    pub path: Utf8PathBuf,
    /// Whether the file was reused from an earlier fetch.
    pub from_cache: bool,
    /// Size of the plain-text file in bytes.
    pub bytes: u64,
}
