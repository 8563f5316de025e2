//! Facilities for downloading Geonames dump resources into a working
//! directory.
//!
//! [`ResourceFetcher`] streams a [`ResourceKind`] through a
//! [`ResourceSource`], unpacks zipped dumps and moves the plain-text file into
//! place atomically. Existing files are reused according to the configured
//! [`CachePolicy`].
#![forbid(unsafe_code)]

mod archive;
mod error;
mod fetcher;
mod log;
mod resource;
mod source;

#[cfg(any(test, feature = "test-support"))]
mod test_support;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::{StubSource, block_on_for_tests, zip_bytes};

pub use error::{DownloadLogError, FetchError, TransportError};
pub use fetcher::{Fetcher, ResourceFetcher};
pub use log::DownloadLog;
pub use resource::{
    BaseUrl, CachePolicy, CitiesThreshold, DEFAULT_BASE_URL, FetchedResource, ResourceKind,
    ResourceUrl, UnknownThreshold,
};
pub use source::{DEFAULT_USER_AGENT, HttpResourceSource, ResourceSource};
