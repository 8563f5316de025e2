//! Unpacking of zipped dumps.

use std::io::{self, BufReader, Read, Seek};

use camino::Utf8Path;
use tempfile::NamedTempFile;
use zip::ZipArchive;

use super::{FetchError, ResourceKind};

/// Copy the entry for `kind` out of `archive` into a temporary file inside
/// `working_dir`.
///
/// The entry whose name equals the plain file name wins; otherwise the first
/// `.txt` entry is used.
pub(super) fn extract(
    archive: &mut NamedTempFile,
    kind: &ResourceKind,
    working_dir: &Utf8Path,
) -> Result<(NamedTempFile, u64), FetchError> {
    let resource = kind.remote_name();
    let wanted = kind.local_name();
    archive
        .as_file_mut()
        .rewind()
        .map_err(|source| FetchError::ExtractArchive {
            entry: wanted.clone(),
            source,
        })?;
    let mut zip = ZipArchive::new(BufReader::new(archive.as_file_mut())).map_err(|source| {
        FetchError::OpenArchive {
            resource: resource.clone(),
            source,
        }
    })?;
    let index = entry_index(&zip, &wanted).ok_or_else(|| FetchError::MissingArchiveEntry {
        resource: resource.clone(),
        entry: wanted.clone(),
    })?;
    let mut entry = zip
        .by_index(index)
        .map_err(|source| FetchError::OpenArchive { resource, source })?;
    let entry_name = entry.name().to_owned();

    let mut output =
        NamedTempFile::new_in(working_dir).map_err(|source| FetchError::WriteResource {
            source,
            path: working_dir.to_path_buf(),
        })?;
    let written = io::copy(&mut entry, output.as_file_mut()).map_err(|source| {
        FetchError::ExtractArchive {
            entry: entry_name,
            source,
        }
    })?;
    Ok((output, written))
}

fn entry_index<R: Read + Seek>(zip: &ZipArchive<R>, wanted: &str) -> Option<usize> {
    zip.index_for_name(wanted).or_else(|| {
        (0..zip.len()).find(|&index| {
            zip.name_for_index(index)
                .is_some_and(|name| !name.ends_with('/') && name.ends_with(".txt"))
        })
    })
}
