//! Phase sequencing for seeds and daily updates.

use geonames_core::{EntityClass, GeoStore, PersistenceError};
use log::{info, warn};

use super::{
    NoopObserver, Phase, PhaseCounts, PhaseReport, SyncConfig, SyncError, SyncObserver, SyncReport,
};
use crate::fetch::{FetchedResource, Fetcher, ResourceKind};
use crate::mapper::{Keyed, MapperSet, RecordMapper, TranslationMapper};
use crate::reference::{CountryInfoTable, ReferenceTables};
use crate::tabular::{
    self, AlternateNameDeletionRecord, AlternateNameRecord, DeletionRecord, GeoRecord,
    RecordError, TabularError, TabularSchema,
};

/// Drives fetch, parse, map and persist for one store.
///
/// The engine is the only writer to its store for the duration of a run.
/// Reference tables are loaded at the start of each run and dropped when it
/// ends.
#[derive(Debug)]
pub struct SyncEngine<F, S, O = NoopObserver> {
    fetcher: F,
    store: S,
    config: SyncConfig,
    observer: O,
}

impl<F, S> SyncEngine<F, S, NoopObserver>
where
    F: Fetcher,
    S: GeoStore,
{
    /// Compose an engine from its collaborators.
    pub const fn new(fetcher: F, store: S, config: SyncConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
            observer: NoopObserver,
        }
    }
}

impl<F, S, O> SyncEngine<F, S, O>
where
    F: Fetcher,
    S: GeoStore,
    O: SyncObserver,
{
    /// Replace the observer notified of phase boundaries and progress.
    pub fn with_observer<T: SyncObserver>(self, observer: T) -> SyncEngine<F, S, T> {
        SyncEngine {
            fetcher: self.fetcher,
            store: self.store,
            config: self.config,
            observer,
        }
    }

    /// Populate the store from the bulk dumps.
    ///
    /// Runs the reference, place and (unless disabled) translation phases.
    /// Nothing is deleted.
    pub async fn seed(&mut self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        let (references, _) = self.load_references(&mut report).await?;
        let mappers = MapperSet::new(&references, self.config.min_population);
        let kind = self.config.seed_source.resource_kind();
        self.upsert_places(Phase::SeedPlaces, kind, &mappers, &mut report)
            .await?;
        if self.config.translations {
            self.upsert_translations(
                Phase::SeedTranslations,
                ResourceKind::AlternateNames,
                &mut report,
            )
            .await?;
        }
        info!("Seed finished: {}", report.totals());
        Ok(report)
    }

    /// Apply the deltas published for the configured date.
    ///
    /// Phases run strictly in order: supply countries, modifications,
    /// deletions, then the translation deltas. A failing phase aborts the run;
    /// earlier phases stay applied.
    pub async fn daily_update(&mut self) -> Result<SyncReport, SyncError> {
        let date = self.config.date;
        let mut report = SyncReport::default();
        let (references, country_info) = self.load_references(&mut report).await?;
        let mappers = MapperSet::new(&references, self.config.min_population);

        self.supply_countries(&references, &mappers, country_info, &mut report)?;
        self.upsert_places(
            Phase::Modifications,
            ResourceKind::DailyModifications(date),
            &mappers,
            &mut report,
        )
        .await?;
        self.delete_places(ResourceKind::DailyDeletes(date), &mut report)
            .await?;
        if self.config.translations {
            self.upsert_translations(
                Phase::TranslationModifications,
                ResourceKind::DailyAlternateNamesModifications(date),
                &mut report,
            )
            .await?;
            self.delete_translations(
                ResourceKind::DailyAlternateNamesDeletes(date),
                &mut report,
            )
            .await?;
        }
        info!("Daily update for {date} finished: {}", report.totals());
        Ok(report)
    }

    async fn load_references(
        &mut self,
        report: &mut SyncReport,
    ) -> Result<(ReferenceTables, FetchedResource), SyncError> {
        let phase = Phase::References;
        self.observer.phase_started(phase);
        let resource = self.fetch(phase, ResourceKind::CountryInfo).await?;
        let countries = CountryInfoTable::load(&resource.path)
            .map_err(|source| SyncError::Reference { phase, source })?;
        let counts = PhaseCounts {
            malformed: countries.malformed(),
            ..PhaseCounts::default()
        };
        self.finish(
            report,
            PhaseReport {
                phase,
                resource: Some(resource.clone()),
                counts,
                skipped: false,
            },
        );
        Ok((ReferenceTables::new(countries), resource))
    }

    fn supply_countries(
        &mut self,
        references: &ReferenceTables,
        mappers: &MapperSet<'_>,
        resource: FetchedResource,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let phase = Phase::SupplyCountries;
        self.observer.phase_started(phase);
        let persistence = |source| SyncError::Persistence { phase, source };
        let populated = self
            .store
            .has_any_rows(EntityClass::Country)
            .map_err(persistence)?;
        let mut counts = PhaseCounts::default();
        if !populated {
            for info in references.countries.iter() {
                let attributes = mappers.countries().supply(info);
                self.store
                    .upsert(info.geoname_id, &attributes)
                    .map_err(persistence)?;
                counts.upserted += 1;
            }
            self.store.flush().map_err(persistence)?;
        }
        self.finish(
            report,
            PhaseReport {
                phase,
                resource: Some(resource),
                counts,
                skipped: populated,
            },
        );
        Ok(())
    }

    async fn upsert_places(
        &mut self,
        phase: Phase,
        kind: ResourceKind,
        mappers: &MapperSet<'_>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        self.observer.phase_started(phase);
        let resource = self.fetch(phase, kind).await?;
        let counts = self.stream(phase, &resource, |store, record: GeoRecord, counts| {
            match mappers.map(&record) {
                Some(attributes) => {
                    store.upsert(record.external_id(), &attributes)?;
                    counts.upserted += 1;
                }
                None => counts.filtered += 1,
            }
            Ok(())
        })?;
        self.finish(report, PhaseReport::completed(phase, resource, counts));
        Ok(())
    }

    async fn delete_places(
        &mut self,
        kind: ResourceKind,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let phase = Phase::Deletions;
        self.observer.phase_started(phase);
        let resource = self.fetch(phase, kind).await?;
        let counts = self.stream(phase, &resource, |store, record: DeletionRecord, counts| {
            let mut removed = false;
            for class in EntityClass::GEONAMES {
                removed |= store.delete_by_external_id(class, record.geoname_id)?;
            }
            if removed {
                counts.deleted += 1;
            } else {
                counts.absent += 1;
            }
            Ok(())
        })?;
        self.finish(report, PhaseReport::completed(phase, resource, counts));
        Ok(())
    }

    async fn upsert_translations(
        &mut self,
        phase: Phase,
        kind: ResourceKind,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        self.observer.phase_started(phase);
        let resource = self.fetch(phase, kind).await?;
        let mapper = TranslationMapper::new().with_languages(&self.config.languages);
        let counts = self.stream(phase, &resource, |store, record: AlternateNameRecord, counts| {
            match mapper.map(&record) {
                Some(attributes) => {
                    store.upsert(record.external_id(), &attributes)?;
                    counts.upserted += 1;
                }
                None => counts.filtered += 1,
            }
            Ok(())
        })?;
        self.finish(report, PhaseReport::completed(phase, resource, counts));
        Ok(())
    }

    async fn delete_translations(
        &mut self,
        kind: ResourceKind,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let phase = Phase::TranslationDeletions;
        self.observer.phase_started(phase);
        let resource = self.fetch(phase, kind).await?;
        let counts = self.stream(
            phase,
            &resource,
            |store, record: AlternateNameDeletionRecord, counts| {
                let id = record.alternate_name_id;
                if store.delete_by_external_id(EntityClass::Translation, id)? {
                    counts.deleted += 1;
                } else {
                    counts.absent += 1;
                }
                Ok(())
            },
        )?;
        self.finish(report, PhaseReport::completed(phase, resource, counts));
        Ok(())
    }

    async fn fetch(&self, phase: Phase, kind: ResourceKind) -> Result<FetchedResource, SyncError> {
        self.fetcher
            .fetch(&kind)
            .await
            .map_err(|source| SyncError::Fetch { phase, source })
    }

    /// Stream every record of `resource` through `apply`, counting malformed
    /// lines, then flush the store.
    fn stream<R, A>(
        &mut self,
        phase: Phase,
        resource: &FetchedResource,
        mut apply: A,
    ) -> Result<PhaseCounts, SyncError>
    where
        R: TabularSchema,
        A: FnMut(&mut S, R, &mut PhaseCounts) -> Result<(), PersistenceError>,
    {
        let mut records = tabular::parse::<R>(&resource.path)
            .map_err(|source| SyncError::Parse { phase, source })?;
        let mut counts = PhaseCounts::default();
        let interval = self.config.progress_interval;
        let mut since_progress = 0_u64;
        while let Some(item) = records.next() {
            match item {
                Ok(record) => apply(&mut self.store, record, &mut counts)
                    .map_err(|source| SyncError::Persistence { phase, source })?,
                Err(RecordError::Malformed(err)) => {
                    warn!("{phase}: skipping {err}");
                    counts.malformed += 1;
                }
                Err(RecordError::Read { path, line, source }) => {
                    return Err(SyncError::Parse {
                        phase,
                        source: TabularError::Read { path, line, source },
                    });
                }
            }
            since_progress += 1;
            if interval > 0 && since_progress >= interval {
                since_progress = 0;
                self.observer.progress(phase, records.progress());
            }
        }
        self.store
            .flush()
            .map_err(|source| SyncError::Persistence { phase, source })?;
        Ok(counts)
    }

    fn finish(&mut self, report: &mut SyncReport, phase_report: PhaseReport) {
        info!("{} finished: {}", phase_report.phase, phase_report.counts);
        self.observer.phase_finished(&phase_report);
        report.push(phase_report);
    }
}
