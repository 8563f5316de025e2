use geonames_core::PersistenceError;
use thiserror::Error;

use super::Phase;
use crate::fetch::FetchError;
use crate::reference::ReferenceError;
use crate::tabular::TabularError;

/// Fatal errors that abort a run. Phases completed before the failure stay
/// committed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A resource could not be fetched.
    #[error("{phase} phase failed to fetch its resource: {source}")]
    Fetch { phase: Phase, source: FetchError },
    /// A fetched file could not be read.
    #[error("{phase} phase failed to read its resource: {source}")]
    Parse { phase: Phase, source: TabularError },
    /// Reference data could not be loaded.
    #[error("{phase} phase failed to load reference data: {source}")]
    Reference {
        phase: Phase,
        source: ReferenceError,
    },
    /// The store rejected a write.
    #[error("{phase} phase failed to persist: {source}")]
    Persistence {
        phase: Phase,
        source: PersistenceError,
    },
}

impl SyncError {
    /// Phase that failed.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Fetch { phase, .. }
            | Self::Parse { phase, .. }
            | Self::Reference { phase, .. }
            | Self::Persistence { phase, .. } => *phase,
        }
    }
}
