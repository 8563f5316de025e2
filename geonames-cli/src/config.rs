//! Layered configuration for the `seed` and `update` commands.
//!
//! Values come from CLI flags, configuration files and `GEONAMES_`
//! environment variables, merged by `ortho_config` and then validated into
//! [`SeedConfig`] or [`UpdateConfig`].

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Days, NaiveDate, Utc};
use clap::Parser;
use geonames_data::fetch::{CachePolicy, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use geonames_data::store::SqliteGeoStore;
use geonames_data::sync::{SeedSource, SyncConfig};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATE, ARG_SOURCE, ARG_WORKING_DIR, CliError, DEFAULT_DATABASE, DEFAULT_WORKING_DIR,
};

/// CLI arguments for the `seed` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Download the bulk dumps and load every matching record into \
                 the store. Options can come from CLI flags, configuration \
                 files, or GEONAMES_ environment variables.",
    about = "Populate the store from the bulk dumps"
)]
#[ortho_config(prefix = "GEONAMES")]
pub(crate) struct SeedArgs {
    /// Dump to seed from: all-countries or cities500/1000/5000/15000.
    #[arg(long = ARG_SOURCE, value_name = "dump")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) source: Option<String>,
    /// Path to the SQLite store.
    #[arg(long, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Directory receiving downloaded files.
    #[arg(long = ARG_WORKING_DIR, value_name = "dir")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) working_dir: Option<Utf8PathBuf>,
    /// Base URL of the dump endpoint.
    #[arg(long, value_name = "url")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) endpoint: Option<String>,
    /// User agent sent with every request.
    #[arg(long, value_name = "agent")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) user_agent: Option<String>,
    /// SQLite file recording completed downloads.
    #[arg(long, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) download_log: Option<Utf8PathBuf>,
    /// Comma separated translation languages; empty keeps every language.
    #[arg(long, value_name = "codes")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) languages: Option<String>,
    /// Population floor for cities.
    #[arg(long, value_name = "count")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) min_population: Option<u64>,
    /// Writes per SQLite transaction.
    #[arg(long, value_name = "count")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) batch_size: Option<usize>,
    /// Skip the translation phases.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) skip_translations: bool,
    /// Keep downloaded files after the run.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) keep_files: bool,
    /// Download every resource even when a local copy exists.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) refresh: bool,
    /// Print the run report as JSON.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) json: bool,
}

/// CLI arguments for the `update` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Apply the modification and deletion deltas published for \
                 one day. Defaults to yesterday (UTC), the most recent day \
                 the endpoint publishes.",
    about = "Apply one day's deltas"
)]
#[ortho_config(prefix = "GEONAMES")]
pub(crate) struct UpdateArgs {
    /// Day whose deltas to apply, as YYYY-MM-DD.
    #[arg(long = ARG_DATE, value_name = "date")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) date: Option<String>,
    /// Path to the SQLite store.
    #[arg(long, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Directory receiving downloaded files.
    #[arg(long = ARG_WORKING_DIR, value_name = "dir")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) working_dir: Option<Utf8PathBuf>,
    /// Base URL of the dump endpoint.
    #[arg(long, value_name = "url")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) endpoint: Option<String>,
    /// User agent sent with every request.
    #[arg(long, value_name = "agent")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) user_agent: Option<String>,
    /// SQLite file recording completed downloads.
    #[arg(long, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) download_log: Option<Utf8PathBuf>,
    /// Comma separated translation languages; empty keeps every language.
    #[arg(long, value_name = "codes")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) languages: Option<String>,
    /// Population floor for cities.
    #[arg(long, value_name = "count")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) min_population: Option<u64>,
    /// Writes per SQLite transaction.
    #[arg(long, value_name = "count")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) batch_size: Option<usize>,
    /// Skip the translation phases.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) skip_translations: bool,
    /// Keep downloaded files after the run.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) keep_files: bool,
    /// Download every resource even when a local copy exists.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) refresh: bool,
    /// Print the run report as JSON.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) json: bool,
}

impl SeedArgs {
    pub(crate) fn into_config(self) -> Result<SeedConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SeedConfig::try_from(merged)
    }
}

impl UpdateArgs {
    pub(crate) fn into_config(self) -> Result<UpdateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        UpdateConfig::try_from(merged)
    }
}

/// Settings shared by both commands after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunOptions {
    pub(crate) database: Utf8PathBuf,
    pub(crate) working_dir: Utf8PathBuf,
    pub(crate) endpoint: String,
    pub(crate) user_agent: String,
    pub(crate) download_log: Option<Utf8PathBuf>,
    pub(crate) languages: Vec<String>,
    pub(crate) min_population: u64,
    pub(crate) batch_size: usize,
    pub(crate) translations: bool,
    pub(crate) keep_files: bool,
    pub(crate) refresh: bool,
    pub(crate) json: bool,
}

impl RunOptions {
    pub(crate) const fn cache_policy(&self) -> CachePolicy {
        if self.refresh {
            CachePolicy::Refresh
        } else {
            CachePolicy::Reuse
        }
    }

    /// Library configuration for a run over `date`.
    pub(crate) fn sync_config(&self, date: NaiveDate) -> SyncConfig {
        let config = SyncConfig::new(date)
            .with_languages(self.languages.iter().cloned())
            .with_min_population(self.min_population);
        if self.translations {
            config
        } else {
            config.without_translations()
        }
    }

    /// Reject a working directory that exists as something other than a
    /// directory. A missing directory is created by the fetcher.
    pub(crate) fn validate_working_dir(&self) -> Result<(), CliError> {
        require_directory(&self.working_dir, ARG_WORKING_DIR)
    }
}

fn require_directory(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match path.as_std_path().metadata() {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(CliError::WorkingDirNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::InspectPath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn split_languages(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|language| !language.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Apply defaults to the fields both argument structs share.
macro_rules! run_options {
    ($args:expr) => {
        RunOptions {
            database: $args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            working_dir: $args
                .working_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_WORKING_DIR)),
            endpoint: $args
                .endpoint
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            user_agent: $args
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            download_log: $args.download_log,
            languages: split_languages($args.languages),
            min_population: $args.min_population.unwrap_or_default(),
            batch_size: $args
                .batch_size
                .unwrap_or(SqliteGeoStore::DEFAULT_BATCH_SIZE),
            translations: !$args.skip_translations,
            keep_files: $args.keep_files,
            refresh: $args.refresh,
            json: $args.json,
        }
    };
}

/// Resolved `seed` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeedConfig {
    pub(crate) source: SeedSource,
    pub(crate) options: RunOptions,
}

impl TryFrom<SeedArgs> for SeedConfig {
    type Error = CliError;

    fn try_from(args: SeedArgs) -> Result<Self, Self::Error> {
        let source = args
            .source
            .as_deref()
            .map(str::parse::<SeedSource>)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            source,
            options: run_options!(args),
        })
    }
}

/// Resolved `update` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdateConfig {
    pub(crate) date: NaiveDate,
    pub(crate) options: RunOptions,
}

impl TryFrom<UpdateArgs> for UpdateConfig {
    type Error = CliError;

    fn try_from(args: UpdateArgs) -> Result<Self, Self::Error> {
        let date = match args.date {
            Some(raw) => parse_date(&raw)?,
            None => yesterday(Utc::now().date_naive())?,
        };
        Ok(Self {
            date,
            options: run_options!(args),
        })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|source| CliError::InvalidDate {
        field: ARG_DATE,
        value: raw.to_owned(),
        source,
    })
}

/// The most recent day the endpoint has published deltas for.
pub(crate) fn yesterday(today: NaiveDate) -> Result<NaiveDate, CliError> {
    today
        .checked_sub_days(Days::new(1))
        .ok_or(CliError::DateOutOfRange { today })
}

#[cfg(test)]
pub(crate) fn seed_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SeedConfig, CliError> {
    let merged = SeedArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SeedConfig::try_from(merged)
}
