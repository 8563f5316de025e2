//! Fixtures shared by the CLI unit tests.

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use geonames_data::fetch::StubSource;
use tempfile::TempDir;

use crate::config::RunOptions;

pub(super) fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date")
}

/// Temporary root holding the store and the working directory.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn working_dir(&self) -> Utf8PathBuf {
        self.root.join("downloads")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("geonames.sqlite")
    }

    /// Options pointing at this workspace with every flag at its default.
    pub(super) fn options(&self) -> RunOptions {
        RunOptions {
            database: self.database(),
            working_dir: self.working_dir(),
            endpoint: "https://example.org/dump".to_owned(),
            user_agent: "geonames-test".to_owned(),
            download_log: None,
            languages: Vec::new(),
            min_population: 0,
            batch_size: 2,
            translations: true,
            keep_files: false,
            refresh: false,
            json: false,
        }
    }
}

fn country_line(iso: &str, name: &str, geoname_id: u64, continent: &str) -> String {
    format!(
        "{iso}\t{iso}X\t276\t{iso}\t{name}\tCapital\t357022\t83000000\t{continent}\t.{}\tEUR\tEuro\t49\t#####\t^\\d{{5}}$\tde\t{geoname_id}\t\t\n",
        iso.to_lowercase()
    )
}

fn place_line(geoname_id: u64, name: &str, code: &str, country: &str, population: u64) -> String {
    format!(
        "{geoname_id}\t{name}\t{name}\t\t52.5\t13.4\tP\t{code}\t{country}\t\t16\t\t\t\t{population}\t\t34\tEurope/Berlin\t2024-03-09\n"
    )
}

/// A stub endpoint publishing one day of deltas for two countries.
pub(super) fn daily_source() -> StubSource {
    let countries = format!(
        "# ISO\tISO3\n{}{}",
        country_line("DE", "Germany", 2_921_044, "EU"),
        country_line("FR", "France", 3_017_382, "EU")
    );
    StubSource::new()
        .with_file("countryInfo.txt", countries)
        .with_file(
            "modifications-2024-03-09.txt",
            place_line(2_950_159, "Berlin", "PPLC", "DE", 3_644_826),
        )
        .with_file("deletes-2024-03-09.txt", "2988507\tParis\tduplicate\n")
        .with_file(
            "alternateNamesModifications-2024-03-09.txt",
            "1556441\t2950159\tde\tBerlin\t1\t\t\t\n",
        )
        .with_file("alternateNamesDeletes-2024-03-09.txt", "1556440\t2950159\n")
}
