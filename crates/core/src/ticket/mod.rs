//! Campaign tickets and their per-pixel reporting units.

mod split;
mod types;

pub use split::{split_ticket, TicketDataError};
pub use types::{ReportingUnit, Ticket};
