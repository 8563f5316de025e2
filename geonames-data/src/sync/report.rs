//! Per-phase outcomes of a synchronisation run.

use std::fmt;

use serde::Serialize;

use crate::fetch::FetchedResource;

/// Steps of a seed or daily update, in the order they can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fetch and load the country-info reference table.
    References,
    /// Stream the seed dump into the store.
    SeedPlaces,
    /// Stream every alternate name into the store.
    SeedTranslations,
    /// Supply countries from reference data into an empty store.
    SupplyCountries,
    /// Apply the daily modifications.
    Modifications,
    /// Apply the daily deletions.
    Deletions,
    /// Apply the daily alternate-name modifications.
    TranslationModifications,
    /// Apply the daily alternate-name deletions.
    TranslationDeletions,
}

impl Phase {
    /// Short label used in logs and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::References => "references",
            Self::SeedPlaces => "seed places",
            Self::SeedTranslations => "seed translations",
            Self::SupplyCountries => "supply countries",
            Self::Modifications => "modifications",
            Self::Deletions => "deletions",
            Self::TranslationModifications => "translation modifications",
            Self::TranslationDeletions => "translation deletions",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Record tallies for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PhaseCounts {
    /// Rows inserted or overwritten.
    pub upserted: u64,
    /// Rows removed.
    pub deleted: u64,
    /// Deletions of rows that did not exist.
    pub absent: u64,
    /// Records rejected by every mapper.
    pub filtered: u64,
    /// Lines skipped as malformed.
    pub malformed: u64,
}

impl PhaseCounts {
    fn add(&mut self, other: &Self) {
        self.upserted += other.upserted;
        self.deleted += other.deleted;
        self.absent += other.absent;
        self.filtered += other.filtered;
        self.malformed += other.malformed;
    }
}

impl fmt::Display for PhaseCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "upserted {}, deleted {}, absent {}, filtered {}, malformed {}",
            self.upserted, self.deleted, self.absent, self.filtered, self.malformed
        )
    }
}

/// Outcome of one completed phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Phase this report describes.
    pub phase: Phase,
    /// Resource the phase read, if any.
    pub resource: Option<FetchedResource>,
    /// Record tallies for the phase.
    pub counts: PhaseCounts,
    /// Whether the phase found nothing to do.
    pub skipped: bool,
}

impl PhaseReport {
    pub(crate) const fn completed(
        phase: Phase,
        resource: FetchedResource,
        counts: PhaseCounts,
    ) -> Self {
        Self {
            phase,
            resource: Some(resource),
            counts,
            skipped: false,
        }
    }
}

/// Ordered phase reports of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncReport {
    /// Reports in the order the phases ran.
    pub phases: Vec<PhaseReport>,
}

impl SyncReport {
    pub(crate) fn push(&mut self, report: PhaseReport) {
        self.phases.push(report);
    }

    /// Report for `phase`, if it ran.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|report| report.phase == phase)
    }

    /// Phases in the order they completed.
    pub fn order(&self) -> impl Iterator<Item = Phase> + '_ {
        self.phases.iter().map(|report| report.phase)
    }

    /// Counts summed over every phase.
    #[must_use]
    pub fn totals(&self) -> PhaseCounts {
        let mut totals = PhaseCounts::default();
        for report in &self.phases {
            totals.add(&report.counts);
        }
        totals
    }
}
