pub mod aggregator;
pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod query;
pub mod runlog;
pub mod scheduler;
pub mod testing;
pub mod ticket;
pub mod tracker;
pub mod window;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use engine::{QuboleEngine, QueryEngine};
pub use orchestrator::{OrchestratorError, ReportOrchestrator, RunSummary};
pub use tracker::{JiraTracker, Tracker};
pub use window::{ReportWindow, WindowError};
