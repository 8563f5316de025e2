//! Hooks for reporting engine progress.

use log::{debug, info};

use super::{Phase, PhaseReport};
use crate::tabular::ParseProgress;

/// Receives phase boundaries and parse progress from the engine.
///
/// Every method defaults to a no-op.
pub trait SyncObserver {
    fn phase_started(&mut self, _phase: Phase) {}

    fn phase_finished(&mut self, _report: &PhaseReport) {}

    /// Called every `progress_interval` records while a file is streamed.
    fn progress(&mut self, _phase: Phase, _progress: ParseProgress) {}
}

impl<T: SyncObserver + ?Sized> SyncObserver for &mut T {
    fn phase_started(&mut self, phase: Phase) {
        (**self).phase_started(phase);
    }

    fn phase_finished(&mut self, report: &PhaseReport) {
        (**self).phase_finished(report);
    }

    fn progress(&mut self, phase: Phase, progress: ParseProgress) {
        (**self).progress(phase, progress);
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Observer reporting through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn phase_started(&mut self, phase: Phase) {
        info!("Starting {phase}");
    }

    fn progress(&mut self, phase: Phase, progress: ParseProgress) {
        debug!(
            "{phase}: line {} ({:.1}% of {} bytes)",
            progress.line,
            progress.ratio() * 100.0,
            progress.total_bytes
        );
    }
}
