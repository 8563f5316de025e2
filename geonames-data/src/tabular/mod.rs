//! Lazy, line-oriented reader for the tab-separated Geonames formats.
//!
//! [`parse`] opens a file and returns [`Records`], a single-pass iterator that
//! owns the file handle and decodes one line at a time into a typed record
//! described by a [`TabularSchema`]. Bad lines never abort iteration: they are
//! yielded as [`RecordError::Malformed`] so callers can count and skip them.
//! Only I/O failures surface as [`RecordError::Read`].

use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    marker::PhantomData,
    str::FromStr,
};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use geonames_core::ExternalId;
use thiserror::Error;

mod schemas;

pub use schemas::{
    AlternateNameDeletionRecord, AlternateNameRecord, CountryInfoRecord, DeletionRecord, GeoRecord,
};


/// Column layout and decoding rules of one tab-separated format.
pub trait TabularSchema: Sized {
    /// Human readable format name used in diagnostics.
    const NAME: &'static str;
    /// Column names in file order.
    const COLUMNS: &'static [&'static str];
    /// Minimum number of fields a line must carry.
    const MIN_FIELDS: usize = Self::COLUMNS.len();
    /// Lines starting with this prefix are skipped.
    const COMMENT_PREFIX: Option<&'static str> = None;

    /// Decode one line's fields.
    fn from_fields(fields: &Fields<'_>) -> Result<Self, FieldError>;
}

/// Fields of a single line, addressed by column index.
#[derive(Debug)]
pub struct Fields<'a> {
    columns: &'static [&'static str],
    values: Vec<&'a str>,
}

/// A field that could not be coerced into its column type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {column} has invalid value {value:?}: {reason}")]
pub struct FieldError {
    /// Column name.
    pub column: &'static str,
    /// Raw field contents.
    pub value: String,
    /// Coercion failure.
    pub reason: String,
}

impl<'a> Fields<'a> {
    fn new(columns: &'static [&'static str], line: &'a str) -> Self {
        Self {
            columns,
            values: line.split('\t').collect(),
        }
    }

    /// Number of fields on the line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the line carried no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Trimmed contents of column `index`; missing trailing columns read as empty.
    #[must_use]
    pub fn text(&self, index: usize) -> &'a str {
        self.values.get(index).map_or("", |value| value.trim())
    }

    /// Owned contents of column `index`.
    #[must_use]
    pub fn string(&self, index: usize) -> String {
        self.text(index).to_owned()
    }

    /// Contents of column `index`, with empty fields mapped to `None`.
    #[must_use]
    pub fn optional_string(&self, index: usize) -> Option<String> {
        Some(self.text(index))
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    /// Parse a mandatory column.
    pub fn required<T>(&self, index: usize) -> Result<T, FieldError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.text(index);
        if raw.is_empty() {
            return Err(self.invalid(index, "value is required"));
        }
        raw.parse().map_err(|err: T::Err| self.invalid(index, err))
    }

    /// Parse an optional column, mapping the empty string to `None`.
    pub fn optional<T>(&self, index: usize) -> Result<Option<T>, FieldError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.text(index);
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|err: T::Err| self.invalid(index, err))
    }

    /// Parse a mandatory geonames identifier.
    pub fn id(&self, index: usize) -> Result<ExternalId, FieldError> {
        self.text(index)
            .parse()
            .map_err(|err| self.invalid(index, err))
    }

    /// Parse an optional `YYYY-MM-DD` date.
    pub fn date(&self, index: usize) -> Result<Option<NaiveDate>, FieldError> {
        let raw = self.text(index);
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|err| self.invalid(index, err))
    }

    /// Parse a `0`/`1` flag; the empty string reads as `false`.
    pub fn flag(&self, index: usize) -> Result<bool, FieldError> {
        match self.text(index) {
            "" | "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(self.invalid(index, "expected 0, 1 or empty")),
        }
    }

    fn invalid(&self, index: usize, reason: impl fmt::Display) -> FieldError {
        FieldError {
            column: self.columns.get(index).copied().unwrap_or("?"),
            value: self.text(index).to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// The line had fewer fields than the schema requires.
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    /// The line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    /// A field failed coercion.
    #[error(transparent)]
    InvalidField(#[from] FieldError),
}

/// A line that could not be decoded into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{schema} line {line}: {reason}")]
pub struct MalformedRecord {
    /// Format being parsed.
    pub schema: &'static str,
    /// One-based line number.
    pub line: u64,
    /// What went wrong.
    pub reason: MalformedReason,
}

/// Error yielded in place of a record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The line was skipped; iteration continues.
    #[error(transparent)]
    Malformed(#[from] MalformedRecord),
    /// Reading from the file failed; iteration ends.
    #[error("failed to read {path} at line {line}: {source}")]
    Read {
        path: Utf8PathBuf,
        line: u64,
        source: io::Error,
    },
}

/// Errors that stop a file from being read.
#[derive(Debug, Error)]
pub enum TabularError {
    /// The file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open { path: Utf8PathBuf, source: io::Error },
    /// The file size could not be determined.
    #[error("failed to inspect {path}: {source}")]
    Inspect { path: Utf8PathBuf, source: io::Error },
    /// Reading the file failed part-way through.
    #[error("failed to read {path} at line {line}: {source}")]
    Read {
        path: Utf8PathBuf,
        line: u64,
        source: io::Error,
    },
}

/// Position of a [`Records`] iterator within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseProgress {
    /// Number of lines consumed so far.
    pub line: u64,
    /// Number of bytes consumed so far.
    pub bytes_read: u64,
    /// Size of the file when it was opened.
    pub total_bytes: u64,
}

impl ParseProgress {
    /// Fraction of the file consumed, between `0.0` and `1.0`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        #[expect(
            clippy::cast_precision_loss,
            reason = "progress ratios tolerate rounding"
        )]
        let ratio = self.bytes_read as f64 / self.total_bytes as f64;
        ratio.clamp(0.0, 1.0)
    }
}

/// Open `path` and iterate its records lazily.
///
/// # Examples
/// ```
/// use geonames_data::tabular::{DeletionRecord, parse};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let path = camino::Utf8PathBuf::try_from(dir.path().join("deletes.txt"))?;
/// std::fs::write(&path, "2950159\tBerlin\tduplicate\n\n6255148\n")?;
///
/// let ids: Vec<u64> = parse::<DeletionRecord>(&path)?
///     .filter_map(Result::ok)
///     .map(|record| record.geoname_id.get())
///     .collect();
/// assert_eq!(ids, [2_950_159, 6_255_148]);
/// # Ok(())
/// # }
/// ```
pub fn parse<S: TabularSchema>(path: &Utf8Path) -> Result<Records<S>, TabularError> {
    let file = File::open(path.as_std_path()).map_err(|source| TabularError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let total_bytes = file
        .metadata()
        .map_err(|source| TabularError::Inspect {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    Ok(Records {
        reader: BufReader::new(file),
        path: path.to_path_buf(),
        buffer: Vec::new(),
        progress: ParseProgress {
            total_bytes,
            ..ParseProgress::default()
        },
        finished: false,
        schema: PhantomData,
    })
}

/// Single-pass iterator over the records of one file.
#[derive(Debug)]
pub struct Records<S> {
    reader: BufReader<File>,
    path: Utf8PathBuf,
    buffer: Vec<u8>,
    progress: ParseProgress,
    finished: bool,
    schema: PhantomData<fn() -> S>,
}

impl<S: TabularSchema> Records<S> {
    /// Current position within the file.
    #[must_use]
    pub const fn progress(&self) -> ParseProgress {
        self.progress
    }

    /// Path of the file being read.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn decode(&self) -> Option<Result<S, RecordError>> {
        let malformed = |reason| {
            Some(Err(RecordError::Malformed(MalformedRecord {
                schema: S::NAME,
                line: self.progress.line,
                reason,
            })))
        };
        let Ok(line) = std::str::from_utf8(&self.buffer) else {
            return malformed(MalformedReason::InvalidUtf8);
        };
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return None;
        }
        if S::COMMENT_PREFIX.is_some_and(|prefix| line.starts_with(prefix)) {
            return None;
        }
        let fields = Fields::new(S::COLUMNS, line);
        if fields.len() < S::MIN_FIELDS {
            return malformed(MalformedReason::TooFewFields {
                expected: S::MIN_FIELDS,
                found: fields.len(),
            });
        }
        match S::from_fields(&fields) {
            Ok(record) => Some(Ok(record)),
            Err(err) => malformed(MalformedReason::InvalidField(err)),
        }
    }
}

impl<S: TabularSchema> Iterator for Records<S> {
    type Item = Result<S, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => self.finished = true,
                Ok(read) => {
                    self.progress.line += 1;
                    self.progress.bytes_read = self
                        .progress
                        .bytes_read
                        .saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
                    if let Some(item) = self.decode() {
                        return Some(item);
                    }
                }
                Err(source) => {
                    self.finished = true;
                    return Some(Err(RecordError::Read {
                        path: self.path.clone(),
                        line: self.progress.line + 1,
                        source,
                    }));
                }
            }
        }
        None
    }
}
