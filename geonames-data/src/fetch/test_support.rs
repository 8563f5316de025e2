//! Shared fixtures for fetch tests.
use std::{
    cell::RefCell,
    collections::BTreeMap,
    future::Future,
    io::{Cursor, Write},
};

use async_trait::async_trait;
use zip::{ZipWriter, write::SimpleFileOptions};

use super::{BaseUrl, ResourceSource, ResourceUrl, TransportError};

/// Stub [`ResourceSource`] serving in-memory files keyed by remote file name.
///
/// Files that were never registered answer with HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct StubSource {
    base_url: BaseUrl,
    files: BTreeMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubSource {
    /// Construct an empty stub rooted at `https://example.org/dump`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: BaseUrl::from("https://example.org/dump"),
            ..Self::default()
        }
    }

    /// Serve `bytes` under the remote file name `name`.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(name.into(), bytes.into());
        self
    }

    /// Serve a zip archive named `name` holding the given entries.
    #[must_use]
    pub fn with_archive(self, name: impl Into<String>, entries: &[(&str, &[u8])]) -> Self {
        self.with_file(name, zip_bytes(entries))
    }

    /// Remote file names requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ResourceSource for StubSource {
    fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    async fn download(
        &self,
        url: &ResourceUrl,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        let name = url.file_name().to_owned();
        self.requests.borrow_mut().push(name.clone());
        let Some(bytes) = self.files.get(&name) else {
            return Err(TransportError::Http {
                url: url.to_string(),
                status: 404,
                message: format!("{name} not found"),
            });
        };
        sink.write_all(bytes)
            .map_err(|source| TransportError::Sink {
                url: url.to_string(),
                source,
            })?;
        let length = u64::try_from(bytes.len()).expect("stub payload length should fit in u64");
        Ok(length)
    }
}

/// Build an in-memory zip archive from `(name, contents)` pairs.
#[must_use]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("stub archive entry should start");
        writer
            .write_all(contents)
            .expect("stub archive entry should be written");
    }
    writer
        .finish()
        .expect("stub archive should finish")
        .into_inner()
}

/// Drive `future` to completion on a single-threaded runtime.
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime should build")
        .block_on(future)
}
