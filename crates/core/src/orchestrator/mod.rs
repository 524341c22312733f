//! Weekly report orchestration.
//!
//! One [`ReportOrchestrator::run`] call is one complete weekly report:
//! window computation, ticket discovery, concurrent query fan-out, comment
//! posting and the consolidated run log at the end.

mod runner;
mod types;

pub use runner::ReportOrchestrator;
pub use types::{OrchestratorError, RunSummary};
