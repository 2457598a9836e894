//! Run statistics for a pipeline batch.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use super::TitleOutcome;

/// Counters from a pipeline run.
///
/// Uses atomic counters for thread-safe updates from concurrent title tasks.
#[derive(Debug, Default)]
pub struct PipelineStats {
    stored: AtomicUsize,
    already_present: AtomicUsize,
    failed: AtomicUsize,
}

/// Plain, serializable view of [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Titles whose PDF was downloaded.
    pub stored: usize,
    /// Titles whose PDF already existed.
    pub already_present: usize,
    /// Titles appended to the failure log.
    pub failed: usize,
    /// All titles processed.
    pub total: usize,
}

impl PipelineStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of freshly downloaded artifacts.
    #[must_use]
    pub fn stored(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }

    /// Returns the number of titles whose artifact already existed.
    #[must_use]
    pub fn already_present(&self) -> usize {
        self.already_present.load(Ordering::SeqCst)
    }

    /// Returns the number of recorded failures.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of titles processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.stored() + self.already_present() + self.failed()
    }

    /// Returns a plain copy of the counters.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            stored: self.stored(),
            already_present: self.already_present(),
            failed: self.failed(),
            total: self.total(),
        }
    }

    /// Counts one terminal outcome.
    pub(crate) fn observe(&self, outcome: &TitleOutcome) {
        let counter = match outcome {
            TitleOutcome::Stored(_) => &self.stored,
            TitleOutcome::AlreadyPresent(_) => &self.already_present,
            TitleOutcome::FailureLogged(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}
