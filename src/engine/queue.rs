// src/engine/queue.rs

use std::path::PathBuf;

use tracing::debug;

/// Holds the trigger for the *next* run while the current run is still
/// active or draining.
///
/// Every qualifying change observed during a run collapses into a single
/// future run; only the most recent path is kept as that run's reason.
#[derive(Debug, Default)]
pub struct PendingTrigger {
    slot: Option<PathBuf>,
    coalesced: usize,
}

impl PendingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no trigger is queued.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Record a qualifying change observed while a run is in flight.
    pub fn record(&mut self, path: PathBuf) {
        if self.slot.is_some() {
            self.coalesced += 1;
            debug!(
                path = %path.display(),
                coalesced = self.coalesced,
                "coalesced change into pending trigger"
            );
        } else {
            debug!(path = %path.display(), "queued change as pending trigger");
        }
        self.slot = Some(path);
    }

    /// Take the pending trigger, clearing the slot.
    pub fn take(&mut self) -> Option<PathBuf> {
        self.coalesced = 0;
        self.slot.take()
    }

    /// Drop anything queued (used when shutting down).
    pub fn clear(&mut self) {
        self.slot = None;
        self.coalesced = 0;
    }
}
