//! Error types emitted by the Geonames CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use geonames_data::fetch::{DownloadLogError, TransportError};
use geonames_data::store::SqliteStoreError;
use geonames_data::sync::{SyncError, UnknownSeedSource};
use thiserror::Error;

/// Errors emitted by the Geonames CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The seed source name is not one of the published dumps.
    #[error(transparent)]
    InvalidSeedSource(#[from] UnknownSeedSource),
    /// The update date is not a `YYYY-MM-DD` date.
    #[error("invalid {field} {value:?}: {source}")]
    InvalidDate {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// The default update date could not be computed.
    #[error("cannot derive the day before {today}")]
    DateOutOfRange { today: chrono::NaiveDate },
    /// The working directory exists but is not a directory.
    #[error("working directory {path:?} is not a directory")]
    WorkingDirNotDirectory { path: Utf8PathBuf },
    /// Inspecting a configured path failed.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectPath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The async runtime could not start.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client for {endpoint}: {source}")]
    BuildSource {
        endpoint: String,
        #[source]
        source: TransportError,
    },
    /// The download log could not be opened.
    #[error(transparent)]
    DownloadLog(#[from] DownloadLogError),
    /// The SQLite store could not be opened.
    #[error("failed to open store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: SqliteStoreError,
    },
    /// A synchronisation phase failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// Serialising the run report failed.
    #[error("failed to serialise run report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing the run report failed.
    #[error("failed to write run report: {0}")]
    WriteReport(#[source] std::io::Error),
}
