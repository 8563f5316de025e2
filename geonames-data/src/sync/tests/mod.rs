//! Unit coverage for the synchronisation engine.

use super::{
    Phase, PhaseCounts, PhaseReport, SeedSource, SyncConfig, SyncEngine, SyncError, SyncObserver,
};
use crate::fetch::{
    CitiesThreshold, FetchError, ResourceFetcher, StubSource, block_on_for_tests,
};
use crate::tabular::ParseProgress;
use camino::Utf8PathBuf;
use chrono::NaiveDate;
use geonames_core::test_support::MemoryGeoStore;
use geonames_core::{EntityAttributes, EntityClass, ExternalId, PersistenceOperation};
use rstest::{fixture, rstest};
use tempfile::TempDir;

mod behaviour;

pub(super) const DATE: &str = "2024-03-09";

pub(super) fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date")
}

pub(super) fn id(raw: u64) -> ExternalId {
    ExternalId::new(raw).expect("test identifiers are positive")
}

pub(super) fn country_info_line(iso: &str, name: &str, geoname_id: u64, continent: &str) -> String {
    format!(
        "{iso}\t{iso}X\t840\t{iso}\t{name}\tCapital\t100.5\t1000\t{continent}\t.{}\tUSD\tDollar\t1\t#####\t^\\d{{5}}$\ten\t{geoname_id}\t\t\n",
        iso.to_lowercase()
    )
}

pub(super) fn country_info() -> String {
    let mut contents = String::from("# ISO\tISO3\tISO-Numeric\n");
    contents.push_str(&country_info_line("US", "United States", 6_252_001, "NA"));
    contents.push_str(&country_info_line("DE", "Germany", 2_921_044, "EU"));
    contents
}

pub(super) fn geo_line(
    geoname_id: u64,
    name: &str,
    class: &str,
    code: &str,
    country: &str,
    population: u64,
) -> String {
    format!(
        "{geoname_id}\t{name}\t{name}\t\t40.0\t-74.0\t{class}\t{code}\t{country}\t\t01\t\t\t\t{population}\t\t10\tAmerica/New_York\t{DATE}\n"
    )
}

pub(super) fn alternate_name_line(alternate_id: u64, geoname_id: u64, language: &str, name: &str) -> String {
    format!("{alternate_id}\t{geoname_id}\t{language}\t{name}\t1\t\t\t\n")
}

pub(super) fn modifications_name() -> String {
    format!("modifications-{DATE}.txt")
}

pub(super) fn deletes_name() -> String {
    format!("deletes-{DATE}.txt")
}

pub(super) fn translation_modifications_name() -> String {
    format!("alternateNamesModifications-{DATE}.txt")
}

pub(super) fn translation_deletes_name() -> String {
    format!("alternateNamesDeletes-{DATE}.txt")
}

/// A stub endpoint with one day's worth of deltas.
pub(super) fn daily_source(modifications: &str, deletes: &str) -> StubSource {
    StubSource::new()
        .with_file("countryInfo.txt", country_info())
        .with_file(modifications_name(), modifications)
        .with_file(deletes_name(), deletes)
        .with_file(
            translation_modifications_name(),
            alternate_name_line(900, 5_128_581, "de", "Neu York"),
        )
        .with_file(translation_deletes_name(), "901\t5128581\n")
}

pub(super) fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir should be UTF-8")
}

pub(super) fn run_update(
    source: StubSource,
    dir: &TempDir,
    store: &mut MemoryGeoStore,
    config: SyncConfig,
) -> Result<super::SyncReport, SyncError> {
    let fetcher = ResourceFetcher::new(source, utf8(dir));
    let mut engine = SyncEngine::new(fetcher, store, config);
    block_on_for_tests(engine.daily_update())
}

#[fixture]
fn workdir() -> TempDir {
    TempDir::new().expect("failed to create temporary directory")
}

#[fixture]
fn config() -> SyncConfig {
    SyncConfig::new(date())
}

fn counts(report: &super::SyncReport, phase: Phase) -> PhaseCounts {
    report
        .phase(phase)
        .map(|phase_report| phase_report.counts)
        .unwrap_or_else(|| panic!("{phase} should have run"))
}

#[rstest]
fn seed_upserts_only_records_joined_with_reference_data(workdir: TempDir) {
    let source = StubSource::new()
        .with_file("countryInfo.txt", country_info_line("US", "United States", 123, "NA"))
        .with_archive(
            "allCountries.zip",
            &[(
                "allCountries.txt",
                format!(
                    "{}{}",
                    geo_line(123, "United States", "A", "PCLI", "US", 327_000_000),
                    geo_line(456, "Hotel", "S", "HTL", "US", 0)
                )
                .as_bytes(),
            )],
        );
    let fetcher = ResourceFetcher::new(source, utf8(&workdir));
    let mut store = MemoryGeoStore::new();
    let config = SyncConfig::new(date()).without_translations();
    let mut engine = SyncEngine::new(fetcher, &mut store, config);

    let report = block_on_for_tests(engine.seed()).expect("seed should succeed");

    assert_eq!(
        report.order().collect::<Vec<_>>(),
        [Phase::References, Phase::SeedPlaces]
    );
    let places = counts(&report, Phase::SeedPlaces);
    assert_eq!((places.upserted, places.filtered), (1, 1));
    assert_eq!(store.total(), 1);
    let Some(EntityAttributes::Country(country)) = store.get(EntityClass::Country, id(123)) else {
        panic!("country 123 should be stored");
    };
    assert_eq!(country.code, "US");
    assert_eq!(country.name, "United States");
    assert_eq!(country.continent_id, Some(id(6_255_149)));
    assert!(country.place.is_some());
}

#[rstest]
fn seed_streams_translations_and_city_dumps(workdir: TempDir) {
    let source = StubSource::new()
        .with_file("countryInfo.txt", country_info())
        .with_archive(
            "cities15000.zip",
            &[(
                "cities15000.txt",
                geo_line(5_128_581, "New York City", "P", "PPL", "US", 8_000_000).as_bytes(),
            )],
        )
        .with_archive(
            "alternateNamesV2.zip",
            &[(
                "alternateNamesV2.txt",
                format!(
                    "{}{}{}",
                    alternate_name_line(1, 5_128_581, "de", "New York"),
                    alternate_name_line(2, 5_128_581, "post", "10001"),
                    alternate_name_line(3, 5_128_581, "fr", "New York")
                )
                .as_bytes(),
            )],
        );
    let fetcher = ResourceFetcher::new(source, utf8(&workdir));
    let mut store = MemoryGeoStore::new();
    let config = SyncConfig::new(date())
        .with_seed_source(SeedSource::Cities(CitiesThreshold::Cities15000))
        .with_languages(["de"]);
    let mut engine = SyncEngine::new(fetcher, &mut store, config);

    let report = block_on_for_tests(engine.seed()).expect("seed should succeed");

    let translations = counts(&report, Phase::SeedTranslations);
    assert_eq!((translations.upserted, translations.filtered), (1, 2));
    assert_eq!(store.ids(EntityClass::City), [id(5_128_581)]);
    assert_eq!(store.ids(EntityClass::Translation), [id(1)]);
}

#[rstest]
fn daily_update_runs_phases_in_order(workdir: TempDir, config: SyncConfig) {
    let source = daily_source(
        &geo_line(5_128_581, "New York City", "P", "PPL", "US", 8_000_000),
        "2950159\tBerlin\n",
    );
    let mut store = MemoryGeoStore::new();
    let report = run_update(source, &workdir, &mut store, config).expect("update should succeed");

    assert_eq!(
        report.order().collect::<Vec<_>>(),
        [
            Phase::References,
            Phase::SupplyCountries,
            Phase::Modifications,
            Phase::Deletions,
            Phase::TranslationModifications,
            Phase::TranslationDeletions,
        ]
    );
    assert_eq!(counts(&report, Phase::SupplyCountries).upserted, 2);
    assert_eq!(counts(&report, Phase::Modifications).upserted, 1);
    assert_eq!(counts(&report, Phase::Deletions).absent, 1);
    assert_eq!(counts(&report, Phase::TranslationModifications).upserted, 1);
    assert_eq!(counts(&report, Phase::TranslationDeletions).absent, 1);
    assert_eq!(store.len(EntityClass::Country), 2);
    assert_eq!(store.len(EntityClass::City), 1);
    assert_eq!(store.flushes(), 5, "every write phase flushes once");
}

#[rstest]
fn replaying_a_day_converges_to_the_same_state(workdir: TempDir, config: SyncConfig) {
    let modifications = format!(
        "{}{}",
        geo_line(5_128_581, "New York City", "P", "PPL", "US", 8_000_000),
        geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000)
    );
    let source = daily_source(&modifications, "2950159\n");
    let mut store = MemoryGeoStore::new();

    run_update(source.clone(), &workdir, &mut store, config.clone()).expect("first run");
    let after_first = store.clone();
    let replay = run_update(source, &workdir, &mut store, config).expect("second run");

    assert!(store.same_rows(&after_first));
    let supply = replay
        .phase(Phase::SupplyCountries)
        .expect("supply phase is always reported");
    assert!(supply.skipped);
    assert_eq!(supply.counts.upserted, 0);
    assert_eq!(counts(&replay, Phase::Deletions).absent, 1);
}

#[rstest]
fn deletions_apply_after_modifications(workdir: TempDir, config: SyncConfig) {
    let source = daily_source(
        &geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000),
        "2950159\tBerlin\tduplicate\n",
    );
    let mut store = MemoryGeoStore::new();
    let report = run_update(source, &workdir, &mut store, config).expect("update");

    assert_eq!(counts(&report, Phase::Modifications).upserted, 1);
    assert_eq!(counts(&report, Phase::Deletions).deleted, 1);
    assert!(store.get(EntityClass::City, id(2_950_159)).is_none());
}

#[rstest]
fn malformed_lines_are_counted_and_skipped(workdir: TempDir, config: SyncConfig) {
    let modifications = format!(
        "5128581\tbroken\n{}",
        geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000)
    );
    let source = daily_source(&modifications, "not-a-number\n");
    let mut store = MemoryGeoStore::new();
    let report = run_update(source, &workdir, &mut store, config).expect("update");

    let modifications = counts(&report, Phase::Modifications);
    assert_eq!((modifications.upserted, modifications.malformed), (1, 1));
    assert_eq!(counts(&report, Phase::Deletions).malformed, 1);
    assert_eq!(report.totals().malformed, 2);
}

#[rstest]
fn fetch_failures_abort_at_the_failing_phase(workdir: TempDir, config: SyncConfig) {
    let source = StubSource::new()
        .with_file("countryInfo.txt", country_info())
        .with_file(
            modifications_name(),
            geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000),
        );
    let mut store = MemoryGeoStore::new();
    let err = run_update(source, &workdir, &mut store, config).expect_err("deletes are missing");

    assert_eq!(err.phase(), Phase::Deletions);
    assert!(matches!(
        err,
        SyncError::Fetch {
            source: FetchError::Download { .. },
            ..
        }
    ));
    assert!(err.to_string().contains("deletions"), "{err}");
    assert!(
        store.get(EntityClass::City, id(2_950_159)).is_some(),
        "completed phases stay committed"
    );
}

#[rstest]
fn persistence_failures_halt_the_phase(workdir: TempDir, config: SyncConfig) {
    let source = daily_source(
        &geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000),
        "",
    );
    let mut store = MemoryGeoStore::new().fail_on(id(2_950_159));
    let err = run_update(source, &workdir, &mut store, config).expect_err("store rejects Berlin");

    let SyncError::Persistence { phase, source } = err else {
        panic!("expected persistence error, got {err:?}");
    };
    assert_eq!(phase, Phase::Modifications);
    assert_eq!(source.operation, PersistenceOperation::Upsert);
    assert_eq!(store.len(EntityClass::Country), 2, "supply phase stays applied");
}

#[rstest]
fn disabled_translations_skip_alternate_name_deltas(workdir: TempDir) {
    let source = daily_source(
        &geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000),
        "1\n",
    );
    let fetcher = ResourceFetcher::new(source, utf8(&workdir));
    let config = SyncConfig::new(date()).without_translations();
    let mut engine = SyncEngine::new(&fetcher, MemoryGeoStore::new(), config);

    let report = block_on_for_tests(engine.daily_update()).expect("update");

    assert!(report.phase(Phase::TranslationModifications).is_none());
    assert!(report.phase(Phase::TranslationDeletions).is_none());
    assert_eq!(
        fetcher.source().requests(),
        ["countryInfo.txt".to_owned(), modifications_name(), deletes_name()]
    );
}

#[rstest]
fn empty_delta_downloads_abort_the_run(workdir: TempDir, config: SyncConfig) {
    let source = daily_source("", "1\n");
    let mut store = MemoryGeoStore::new();
    let err = run_update(source, &workdir, &mut store, config).expect_err("empty file");

    assert_eq!(err.phase(), Phase::Modifications);
    assert!(matches!(
        err,
        SyncError::Fetch {
            source: FetchError::EmptyResource { .. },
            ..
        }
    ));
}

#[rstest]
fn city_population_floor_filters_small_places(workdir: TempDir) {
    let modifications = format!(
        "{}{}",
        geo_line(1, "Hamlet", "P", "PPL", "DE", 120),
        geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000)
    );
    let source = daily_source(&modifications, "1\n");
    let mut store = MemoryGeoStore::new();
    let config = SyncConfig::new(date()).with_min_population(1_000);
    let report = run_update(source, &workdir, &mut store, config).expect("update");

    let modifications = counts(&report, Phase::Modifications);
    assert_eq!((modifications.upserted, modifications.filtered), (1, 1));
    assert_eq!(store.ids(EntityClass::City), [id(2_950_159)]);
}

#[derive(Debug, Default)]
struct RecordingObserver {
    events: Vec<String>,
    progress: Vec<ParseProgress>,
}

impl SyncObserver for RecordingObserver {
    fn phase_started(&mut self, phase: Phase) {
        self.events.push(format!("start {phase}"));
    }

    fn phase_finished(&mut self, report: &PhaseReport) {
        self.events.push(format!("finish {}", report.phase));
    }

    fn progress(&mut self, phase: Phase, progress: ParseProgress) {
        assert_eq!(phase, Phase::Modifications);
        self.progress.push(progress);
    }
}

#[rstest]
fn observers_see_phase_boundaries_and_progress(workdir: TempDir) {
    let modifications = format!(
        "{}{}",
        geo_line(5_128_581, "New York City", "P", "PPL", "US", 8_000_000),
        geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000)
    );
    let source = StubSource::new()
        .with_file("countryInfo.txt", country_info())
        .with_file(modifications_name(), modifications)
        .with_file(deletes_name(), "1\n");
    let fetcher = ResourceFetcher::new(source, utf8(&workdir));
    let config = SyncConfig::new(date())
        .without_translations()
        .with_progress_interval(2);
    let mut observer = RecordingObserver::default();
    let mut engine =
        SyncEngine::new(fetcher, MemoryGeoStore::new(), config).with_observer(&mut observer);

    block_on_for_tests(engine.daily_update()).expect("update");
    drop(engine);

    assert_eq!(
        observer.events,
        [
            "start references",
            "finish references",
            "start supply countries",
            "finish supply countries",
            "start modifications",
            "finish modifications",
            "start deletions",
            "finish deletions",
        ]
    );
    let [progress] = observer.progress.as_slice() else {
        panic!("expected one progress event, got {:?}", observer.progress);
    };
    assert_eq!(progress.line, 2);
}
