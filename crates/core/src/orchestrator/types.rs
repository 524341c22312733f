//! Types for the report orchestrator.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::BatchSummary;
use crate::tracker::TrackerError;
use crate::window::{ReportWindow, WindowError};

/// Errors that end a report run before any ticket is processed.
///
/// Everything downstream of discovery is absorbed into the run summary
/// instead; a single bad ticket never aborts the batch.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The run was started on a day that has no report window.
    #[error(transparent)]
    InvalidRunDay(#[from] WindowError),

    /// Ticket discovery itself failed; with no tickets there is no run.
    #[error("Ticket discovery failed: {0}")]
    Discovery(#[from] TrackerError),
}

/// Everything a finished run can tell the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique id stamped on this run's log lines.
    pub run_id: Uuid,
    /// The window the run reported on.
    pub window: ReportWindow,
    /// Tickets the discovery search returned.
    pub tickets_found: u64,
    /// Pixels across all fetched tickets.
    pub pixels_total: u64,
    /// Tickets whose field pull failed and were skipped.
    pub fetch_failures: u64,
    /// Per-ticket and per-unit accounting from the batch.
    #[serde(flatten)]
    pub batch: BatchSummary,
}

impl RunSummary {
    /// Summary for a run that found nothing to do.
    pub fn empty(run_id: Uuid, window: ReportWindow) -> Self {
        Self {
            run_id,
            window,
            tickets_found: 0,
            pixels_total: 0,
            fetch_failures: 0,
            batch: BatchSummary::default(),
        }
    }

    /// Alerts of either kind posted during the run.
    pub fn alerts_posted(&self) -> u64 {
        self.batch.accuracy_alerts + self.batch.data_alerts + self.batch.tickets_invalid
    }
}
