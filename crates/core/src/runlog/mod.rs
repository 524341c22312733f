//! In-memory run log.
//!
//! Concurrent report tasks append facts about their ticket to a shared
//! channel; a collector task folds them into per-ticket trails so the end
//! of the run can log one consolidated, readable summary regardless of how
//! the tasks interleaved.

mod collector;
mod types;

pub use collector::{create_run_log, RunLogCollector, RunLogHandle};
pub use types::{RunEntry, RunKey, RunLog};
