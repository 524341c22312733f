//! Validation and splitting of tickets into reporting units.

use thiserror::Error;

use super::types::{ReportingUnit, Ticket};

/// Per-ticket data problems that make reporting impossible.
///
/// These never abort the batch; the scheduler converts them into a data
/// alert on the offending ticket and carries on with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketDataError {
    #[error("Ticket {key} is missing pixels or profile ids")]
    MissingFields { key: String },

    #[error("Ticket {key} has {pixels} pixel(s) but {profile_ids} profile id(s)")]
    MismatchedFields {
        key: String,
        pixels: usize,
        profile_ids: usize,
    },
}

/// Validate a ticket's pixel/profile pairing and split it into units.
///
/// Pixels and profile ids pair by position. A single pair yields one unit
/// with the ticket's content; N pairs yield N units, each owning copies of
/// the shared fields so no unit aliases the ticket or a sibling.
pub fn split_ticket(ticket: &Ticket) -> Result<Vec<ReportingUnit>, TicketDataError> {
    if ticket.pixels.is_empty() || ticket.profile_ids.is_empty() {
        return Err(TicketDataError::MissingFields {
            key: ticket.key.clone(),
        });
    }
    if ticket.pixels.len() != ticket.profile_ids.len() {
        return Err(TicketDataError::MismatchedFields {
            key: ticket.key.clone(),
            pixels: ticket.pixels.len(),
            profile_ids: ticket.profile_ids.len(),
        });
    }

    let units = ticket
        .pixels
        .iter()
        .zip(ticket.profile_ids.iter())
        .map(|(pixel, profile_id)| ReportingUnit {
            key: ticket.key.clone(),
            pixel: pixel.clone(),
            profile_id: profile_id.clone(),
            start_date: ticket.start_date,
            end_date: ticket.end_date,
            manager: ticket.manager.clone(),
        })
        .collect();

    Ok(units)
}
