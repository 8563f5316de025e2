//! Behavioural coverage for daily updates.

use super::{
    country_info, date, deletes_name, geo_line, id, modifications_name, run_update,
};
use crate::fetch::StubSource;
use crate::sync::{Phase, SyncConfig, SyncError, SyncReport};
use geonames_core::EntityClass;
use geonames_core::test_support::MemoryGeoStore;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, path::PathBuf};
use tempfile::TempDir;

const FEATURE: &str = "tests/features/daily_update.feature";

type UpdateResultCell = RefCell<Option<Result<SyncReport, SyncError>>>;

#[fixture]
fn working_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temporary directory: {err}"),
    }
}

#[derive(Debug, Default)]
struct UpdateScenarioContext {
    files: RefCell<Vec<(String, String)>>,
    store: RefCell<MemoryGeoStore>,
    first_run: RefCell<Option<MemoryGeoStore>>,
    result: UpdateResultCell,
}

impl UpdateScenarioContext {
    fn publish(&self, name: String, contents: String) {
        self.files.borrow_mut().push((name, contents));
    }

    fn source(&self) -> StubSource {
        self.files
            .borrow()
            .iter()
            .fold(StubSource::new(), |source, (name, contents)| {
                source.with_file(name.clone(), contents.clone())
            })
    }

    fn apply(&self, dir: &TempDir) {
        let config = SyncConfig::new(date()).without_translations();
        let mut store = self.store.borrow_mut();
        let outcome = run_update(self.source(), dir, &mut store, config);
        *self.result.borrow_mut() = Some(outcome);
    }

    fn report(&self) -> SyncReport {
        match self.result.borrow().as_ref() {
            Some(Ok(report)) => report.clone(),
            Some(Err(err)) => panic!("update should succeed: {err}"),
            None => panic!("update result must be captured"),
        }
    }
}

#[fixture]
fn update_context() -> UpdateScenarioContext {
    UpdateScenarioContext::default()
}

#[given("the published country info for the United States and Germany")]
fn published_country_info(#[from(update_context)] ctx: &UpdateScenarioContext) {
    ctx.publish("countryInfo.txt".to_owned(), country_info());
}

#[given("a day where Berlin is modified and then deleted")]
fn berlin_modified_then_deleted(#[from(update_context)] ctx: &UpdateScenarioContext) {
    ctx.publish(
        modifications_name(),
        geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000),
    );
    ctx.publish(deletes_name(), "2950159\tBerlin\tduplicate\n".to_owned());
}

#[given("a day where New York City is modified")]
fn new_york_modified(#[from(update_context)] ctx: &UpdateScenarioContext) {
    ctx.publish(
        modifications_name(),
        geo_line(5_128_581, "New York City", "P", "PPL", "US", 8_000_000),
    );
    ctx.publish(deletes_name(), "6255148\n".to_owned());
}

#[given("a day whose deletions file was never published")]
fn deletions_missing(#[from(update_context)] ctx: &UpdateScenarioContext) {
    ctx.publish(
        modifications_name(),
        geo_line(2_950_159, "Berlin", "P", "PPLC", "DE", 3_400_000),
    );
}

#[when("I apply the daily update")]
fn apply_update(
    #[from(update_context)] ctx: &UpdateScenarioContext,
    #[from(working_dir)] dir: &TempDir,
) {
    ctx.apply(dir);
}

#[when("I apply the daily update again")]
fn apply_update_again(
    #[from(update_context)] ctx: &UpdateScenarioContext,
    #[from(working_dir)] dir: &TempDir,
) {
    let snapshot = ctx.store.borrow().clone();
    *ctx.first_run.borrow_mut() = Some(snapshot);
    ctx.apply(dir);
}

#[then("Berlin is absent from the store")]
fn berlin_absent(#[from(update_context)] ctx: &UpdateScenarioContext) {
    let report = ctx.report();
    let deletions = report
        .phase(Phase::Deletions)
        .unwrap_or_else(|| panic!("deletions should have run"));
    assert_eq!(deletions.counts.deleted, 1);
    assert!(ctx.store.borrow().get(EntityClass::City, id(2_950_159)).is_none());
}

#[then("the phases ran in update order")]
fn phases_in_order(#[from(update_context)] ctx: &UpdateScenarioContext) {
    let order: Vec<Phase> = ctx.report().order().collect();
    assert_eq!(
        order,
        [
            Phase::References,
            Phase::SupplyCountries,
            Phase::Modifications,
            Phase::Deletions,
        ]
    );
}

#[then("the store matches the state after the first run")]
fn store_unchanged(#[from(update_context)] ctx: &UpdateScenarioContext) {
    let first_run = ctx.first_run.borrow();
    let snapshot = first_run
        .as_ref()
        .unwrap_or_else(|| panic!("first run must be captured"));
    assert!(ctx.store.borrow().same_rows(snapshot));
}

#[then("supplying countries was skipped on the replay")]
fn supply_skipped(#[from(update_context)] ctx: &UpdateScenarioContext) {
    let report = ctx.report();
    let supply = report
        .phase(Phase::SupplyCountries)
        .unwrap_or_else(|| panic!("supply phase should be reported"));
    assert!(supply.skipped);
    assert_eq!(supply.counts.upserted, 0);
}

#[then("the run fails in the deletions phase")]
fn fails_in_deletions(#[from(update_context)] ctx: &UpdateScenarioContext) {
    match ctx.result.borrow().as_ref() {
        Some(Err(err)) => assert_eq!(err.phase(), Phase::Deletions, "{err}"),
        Some(Ok(_)) => panic!("expected the update to fail"),
        None => panic!("update result must be captured"),
    }
}

#[then("the modifications remain applied")]
fn modifications_applied(#[from(update_context)] ctx: &UpdateScenarioContext) {
    let store = ctx.store.borrow();
    assert!(store.get(EntityClass::City, id(2_950_159)).is_some());
    assert_eq!(store.len(EntityClass::Country), 2);
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(FEATURE);
    let contents = match fs::read_to_string(&feature_path) {
        Ok(data) => data,
        Err(err) => panic!("failed to read feature file {feature_path:?}: {err}"),
    };
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        [
            "applying a day of deltas in order",
            "replaying a day leaves the store unchanged",
            "aborting when a delta file is missing",
        ],
        "scenario order changed in {FEATURE}"
    );
}

macro_rules! register_scenario {
    ($name:ident, $index:literal) => {
        #[scenario(path = "tests/features/daily_update.feature", index = $index)]
        fn $name(#[from(update_context)] context: UpdateScenarioContext, working_dir: TempDir) {
            let _ = (context, working_dir);
        }
    };
}

register_scenario!(applying_a_day_of_deltas_in_order, 0);
register_scenario!(replaying_a_day_leaves_the_store_unchanged, 1);
register_scenario!(aborting_when_a_delta_file_is_missing, 2);
