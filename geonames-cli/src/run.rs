//! Execution of the `seed` and `update` commands.

use std::io::Write;

use camino::Utf8Path;
use chrono::{NaiveDate, Utc};
use geonames_data::fetch::{
    DownloadLog, Fetcher, HttpResourceSource, ResourceFetcher, ResourceKind,
};
use geonames_data::store::SqliteGeoStore;
use geonames_data::sync::{LogObserver, SeedSource, SyncEngine, SyncReport};
use log::{debug, warn};

use crate::CliError;
use crate::config::{RunOptions, SeedArgs, UpdateArgs};

/// What a run does once its options are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Seed(SeedSource),
    Update(NaiveDate),
}

impl Mode {
    /// Local files a run of this mode may leave in the working directory.
    pub(crate) fn resources(self, translations: bool) -> Vec<ResourceKind> {
        let mut kinds = vec![ResourceKind::CountryInfo];
        match self {
            Self::Seed(source) => {
                kinds.push(source.resource_kind());
                if translations {
                    kinds.push(ResourceKind::AlternateNames);
                }
            }
            Self::Update(date) => {
                kinds.push(ResourceKind::DailyModifications(date));
                kinds.push(ResourceKind::DailyDeletes(date));
                if translations {
                    kinds.push(ResourceKind::DailyAlternateNamesModifications(date));
                    kinds.push(ResourceKind::DailyAlternateNamesDeletes(date));
                }
            }
        }
        kinds
    }
}

pub(crate) fn run_seed(args: SeedArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let fetcher = build_fetcher(&config.options)?;
    execute(&config.options, Mode::Seed(config.source), fetcher, writer)
}

pub(crate) fn run_update(args: UpdateArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let fetcher = build_fetcher(&config.options)?;
    execute(&config.options, Mode::Update(config.date), fetcher, writer)
}

fn build_fetcher(options: &RunOptions) -> Result<ResourceFetcher<HttpResourceSource>, CliError> {
    options.validate_working_dir()?;
    let source = HttpResourceSource::new(options.endpoint.as_str())
        .map_err(|source| CliError::BuildSource {
            endpoint: options.endpoint.clone(),
            source,
        })?
        .with_user_agent(options.user_agent.as_str());
    let fetcher = ResourceFetcher::new(source, options.working_dir.clone())
        .with_cache_policy(options.cache_policy());
    match &options.download_log {
        Some(path) => Ok(fetcher.with_log(DownloadLog::initialise(path)?)),
        None => Ok(fetcher),
    }
}

/// Run `mode` against the store named in `options`, then report to `writer`.
///
/// Downloaded files are removed afterwards unless `keep_files` is set, also
/// when the run fails.
pub(crate) fn execute<F: Fetcher>(
    options: &RunOptions,
    mode: Mode,
    fetcher: F,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let store = SqliteGeoStore::open(&options.database)
        .map_err(|source| CliError::OpenStore {
            path: options.database.clone(),
            source,
        })?
        .with_batch_size(options.batch_size);

    let config = match mode {
        Mode::Seed(source) => options
            .sync_config(Utc::now().date_naive())
            .with_seed_source(source),
        Mode::Update(date) => options.sync_config(date),
    };
    let mut engine = SyncEngine::new(fetcher, store, config).with_observer(LogObserver);
    let outcome = runtime.block_on(async {
        match mode {
            Mode::Seed(_) => engine.seed().await,
            Mode::Update(_) => engine.daily_update().await,
        }
    });

    if !options.keep_files {
        remove_downloads(&options.working_dir, &mode.resources(options.translations));
    }
    let report = outcome?;
    write_report(writer, &report, options.json)
}

fn remove_downloads(working_dir: &Utf8Path, kinds: &[ResourceKind]) {
    for kind in kinds {
        let path = working_dir.join(kind.local_name());
        match geonames_fs::remove_file_if_exists(&path) {
            Ok(true) => debug!("Removed {path}"),
            Ok(false) => {}
            Err(err) => warn!("Failed to remove {path}: {err}"),
        }
    }
}

pub(crate) fn write_report(
    writer: &mut dyn Write,
    report: &SyncReport,
    json: bool,
) -> Result<(), CliError> {
    if json {
        let payload =
            serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
        return writeln!(writer, "{payload}").map_err(CliError::WriteReport);
    }
    for phase in &report.phases {
        let suffix = if phase.skipped { " (skipped)" } else { "" };
        writeln!(writer, "{}: {}{suffix}", phase.phase, phase.counts)
            .map_err(CliError::WriteReport)?;
    }
    writeln!(writer, "total: {}", report.totals()).map_err(CliError::WriteReport)
}
