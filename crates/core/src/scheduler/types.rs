//! Scheduler outcome types.

use serde::Serialize;

use crate::aggregator::UnitOutcome;

/// What one ticket's task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOutcome {
    /// The ticket was not live for the report window.
    Skipped,
    /// The ticket's field data could not produce reporting units.
    Invalid,
    /// The ticket's units ran; `faults` counts unit tasks that died or
    /// were abandoned.
    Processed {
        outcomes: Vec<UnitOutcome>,
        faults: u64,
    },
}

/// Batch-level accounting, folded together from every ticket task.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Tickets whose units were actually run.
    pub tickets_processed: u64,
    /// Tickets outside the report window.
    pub tickets_skipped: u64,
    /// Tickets with unusable field data.
    pub tickets_invalid: u64,
    /// Units whose results were posted to their ticket.
    pub units_reported: u64,
    /// Units that also triggered the accuracy shortfall alert.
    pub accuracy_alerts: u64,
    /// Units that produced no result and alerted instead.
    pub data_alerts: u64,
    /// Tasks that panicked or tiers that were abandoned mid-dispatch.
    pub faults: u64,
}

impl BatchSummary {
    pub fn absorb(&mut self, outcome: TicketOutcome) {
        match outcome {
            TicketOutcome::Skipped => self.tickets_skipped += 1,
            TicketOutcome::Invalid => self.tickets_invalid += 1,
            TicketOutcome::Processed { outcomes, faults } => {
                self.tickets_processed += 1;
                self.faults += faults;
                for unit in outcomes {
                    match unit {
                        UnitOutcome::Reported => self.units_reported += 1,
                        UnitOutcome::ReportedWithAlert => {
                            self.units_reported += 1;
                            self.accuracy_alerts += 1;
                        }
                        UnitOutcome::DataAlert => self.data_alerts += 1,
                    }
                }
            }
        }
    }

    /// Units that ran to any conclusion in the batch.
    pub fn units_total(&self) -> u64 {
        self.units_reported + self.data_alerts
    }
}

/// Concurrency used per pool tier when none is configured.
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}
