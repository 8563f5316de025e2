//! Error types produced while fetching Geonames resources.

use std::{error::Error as StdError, io};

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors produced while materialising a resource in the working directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The working directory could not be created.
    #[error("failed to create working directory {path}: {source}")]
    CreateDir { source: io::Error, path: Utf8PathBuf },
    /// A cached copy could not be inspected.
    #[error("failed to inspect cached resource {path}: {source}")]
    Inspect { source: io::Error, path: Utf8PathBuf },
    /// The resource URL could not be derived from the base URL.
    #[error("invalid resource url {base}/{name}: {source}")]
    Url {
        base: String,
        name: String,
        source: url::ParseError,
    },
    /// The transport failed while streaming the resource.
    #[error("failed to download {resource}: {source}")]
    Download {
        resource: String,
        source: TransportError,
    },
    /// The server answered with an empty body.
    #[error("downloaded resource {url} is empty")]
    EmptyResource { url: String },
    /// Writing the resource to disk failed.
    #[error("failed to write resource to {path}: {source}")]
    WriteResource { source: io::Error, path: Utf8PathBuf },
    /// The downloaded archive is not a readable zip file.
    #[error("failed to open archive for {resource}: {source}")]
    OpenArchive {
        resource: String,
        source: zip::result::ZipError,
    },
    /// The archive holds no entry matching the resource.
    #[error("archive for {resource} has no {entry} entry")]
    MissingArchiveEntry { resource: String, entry: String },
    /// Reading an archive entry failed.
    #[error("failed to extract {entry} from archive: {source}")]
    ExtractArchive { entry: String, source: io::Error },
    /// Recording the download in the audit log failed.
    #[error(transparent)]
    Log(#[from] DownloadLogError),
}

/// Errors raised by the [`DownloadLog`](super::DownloadLog).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DownloadLogError {
    /// Opening or creating the log database failed.
    #[error("failed to initialise download log at {path}: {source}")]
    Initialise {
        source: rusqlite::Error,
        path: Utf8PathBuf,
    },
    /// Inserting a row failed.
    #[error("failed to record download metadata: {source}")]
    Record { source: rusqlite::Error },
    /// A value could not be converted into an SQLite column.
    #[error("failed to prepare download metadata for persistence ({what}): {source}")]
    RecordValue {
        /// Description of the value that failed to convert.
        what: &'static str,
        /// Underlying conversion error.
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The HTTP client could not be configured.
    #[error("failed to build HTTP client: {message}")]
    Client { message: String },
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description supplied by the server.
        message: String,
    },
    /// The request failed due to an I/O error.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
    /// The local sink rejected streamed bytes.
    #[error("failed to store bytes from {url}: {source}")]
    Sink { url: String, source: io::Error },
}
