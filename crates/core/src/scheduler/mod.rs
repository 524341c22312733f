//! Concurrent batch scheduling.

mod fanout;
mod types;

pub use fanout::FanOutScheduler;
pub use types::{default_pool_size, BatchSummary, TicketOutcome};
