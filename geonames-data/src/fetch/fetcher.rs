//! Materialise resources in the working directory, reusing cached copies.

use std::{io::Write, time::SystemTime};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use geonames_fs::{FileStatus, ensure_dir, file_status};
use log::{debug, info};
use tempfile::NamedTempFile;

use super::{
    CachePolicy, DownloadLog, FetchError, FetchedResource, ResourceKind, ResourceSource, archive,
};

/// Makes a resource available as a local plain-text file.
#[async_trait(?Send)]
pub trait Fetcher {
    /// Fetch `kind`, returning the location of the plain-text file.
    async fn fetch(&self, kind: &ResourceKind) -> Result<FetchedResource, FetchError>;
}

/// [`Fetcher`] that downloads through a [`ResourceSource`] into a working
/// directory.
///
/// # Examples
/// ```no_run
/// use geonames_data::fetch::{CachePolicy, HttpResourceSource, ResourceFetcher};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpResourceSource::new("https://download.geonames.org/export/dump")?;
/// let fetcher = ResourceFetcher::new(source, "/var/cache/geonames")
///     .with_cache_policy(CachePolicy::Refresh);
/// assert_eq!(fetcher.working_dir().as_str(), "/var/cache/geonames");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResourceFetcher<S> {
    source: S,
    working_dir: Utf8PathBuf,
    cache: CachePolicy,
    log: Option<DownloadLog>,
}

impl<S: ResourceSource> ResourceFetcher<S> {
    /// Fetch resources from `source` into `working_dir`.
    pub fn new(source: S, working_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source,
            working_dir: working_dir.into(),
            cache: CachePolicy::default(),
            log: None,
        }
    }

    /// Control when cached files are reused.
    #[must_use]
    pub const fn with_cache_policy(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    /// Record completed downloads in `log`.
    #[must_use]
    pub fn with_log(mut self, log: DownloadLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Directory fetched files are written to.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Borrow the underlying source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    fn cached(&self, target: &Utf8Path) -> Result<Option<FileStatus>, FetchError> {
        if self.cache == CachePolicy::Refresh {
            return Ok(None);
        }
        let status = file_status(target).map_err(|source| FetchError::Inspect {
            source,
            path: target.to_path_buf(),
        })?;
        Ok(status.filter(|found| found.len > 0 && self.is_fresh(found)))
    }

    fn is_fresh(&self, status: &FileStatus) -> bool {
        match self.cache {
            CachePolicy::Reuse => true,
            CachePolicy::Refresh => false,
            // Files stamped in the future count as fresh.
            CachePolicy::MaxAge(max_age) => SystemTime::now()
                .duration_since(status.modified)
                .map_or(true, |age| age <= max_age),
        }
    }

    async fn download(
        &self,
        kind: &ResourceKind,
        target: &Utf8Path,
    ) -> Result<FetchedResource, FetchError> {
        let url = kind.url(self.source.base_url())?;
        let write_error = |source| FetchError::WriteResource {
            source,
            path: target.to_path_buf(),
        };
        let mut download = NamedTempFile::new_in(&self.working_dir).map_err(write_error)?;
        let received = self
            .source
            .download(&url, download.as_file_mut())
            .await
            .map_err(|source| FetchError::Download {
                resource: kind.remote_name(),
                source,
            })?;
        download.as_file_mut().flush().map_err(write_error)?;
        if received == 0 {
            return Err(FetchError::EmptyResource {
                url: url.to_string(),
            });
        }

        let (plain, bytes) = if kind.is_archive() {
            let (plain, bytes) = archive::extract(&mut download, kind, &self.working_dir)?;
            if bytes == 0 {
                return Err(FetchError::EmptyResource {
                    url: url.to_string(),
                });
            }
            (plain, bytes)
        } else {
            (download, received)
        };
        plain
            .persist(target)
            .map_err(|err| write_error(err.error))?;

        let fetched = FetchedResource {
            kind: *kind,
            path: target.to_path_buf(),
            from_cache: false,
            bytes,
        };
        if let Some(log) = &self.log {
            log.record(&fetched, &url)?;
        }
        info!("Downloaded {kind} ({received} bytes) to {target}");
        Ok(fetched)
    }
}

#[async_trait(?Send)]
impl<S: ResourceSource> Fetcher for ResourceFetcher<S> {
    async fn fetch(&self, kind: &ResourceKind) -> Result<FetchedResource, FetchError> {
        ensure_dir(&self.working_dir).map_err(|source| FetchError::CreateDir {
            source,
            path: self.working_dir.clone(),
        })?;
        let target = self.working_dir.join(kind.local_name());
        if let Some(status) = self.cached(&target)? {
            debug!("Reusing cached {kind} at {target}");
            return Ok(FetchedResource {
                kind: *kind,
                path: target,
                from_cache: true,
                bytes: status.len,
            });
        }
        self.download(kind, &target).await
    }
}

#[async_trait(?Send)]
impl<F: Fetcher + ?Sized> Fetcher for &F {
    async fn fetch(&self, kind: &ResourceKind) -> Result<FetchedResource, FetchError> {
        (**self).fetch(kind).await
    }
}
