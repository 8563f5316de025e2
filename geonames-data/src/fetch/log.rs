//! SQLite audit table of completed downloads.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use rusqlite::{Connection, params};

use super::{DownloadLogError, FetchedResource, ResourceKind, ResourceUrl};

/// Persisted audit trail of completed downloads.
#[derive(Debug)]
pub struct DownloadLog {
    connection: Connection,
    location: Utf8PathBuf,
}

impl DownloadLog {
    /// Open (or create) the download log at `path`.
    pub fn initialise(path: &Utf8Path) -> Result<Self, DownloadLogError> {
        let initialise_error = |source| DownloadLogError::Initialise {
            source,
            path: path.to_path_buf(),
        };
        let connection = Connection::open(path.as_std_path()).map_err(initialise_error)?;
        // `delta_date` is null for the bulk dumps.
        connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS downloads (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    resource TEXT NOT NULL,
                    delta_date TEXT,
                    url TEXT NOT NULL,
                    bytes_written INTEGER NOT NULL,
                    output_path TEXT NOT NULL,
                    downloaded_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_downloads_delta_date ON downloads (delta_date);",
            )
            .map_err(initialise_error)?;
        Ok(Self {
            connection,
            location: path.to_path_buf(),
        })
    }

    /// Append a row for a resource that was downloaded rather than reused.
    pub fn record(
        &self,
        resource: &FetchedResource,
        url: &ResourceUrl,
    ) -> Result<(), DownloadLogError> {
        let bytes = i64::try_from(resource.bytes).map_err(|err| DownloadLogError::RecordValue {
            what: "bytes written",
            source: Box::new(err),
        })?;
        let delta_date = match resource.kind {
            ResourceKind::DailyModifications(date)
            | ResourceKind::DailyDeletes(date)
            | ResourceKind::DailyAlternateNamesModifications(date)
            | ResourceKind::DailyAlternateNamesDeletes(date) => Some(date.to_string()),
            _ => None,
        };
        self.connection
            .execute(
                "INSERT INTO downloads (resource, delta_date, url, bytes_written, output_path, downloaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    resource.kind.remote_name(),
                    delta_date,
                    url.as_ref(),
                    bytes,
                    resource.path.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|source| DownloadLogError::Record { source })?;
        Ok(())
    }

    /// Location of the underlying SQLite database.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.location
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}
