//! Core ticket data types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One discovered tracker ticket, reduced to the fields the report needs.
///
/// Built from tracker data at discovery time and read-only afterwards; units
/// are cloned out of it, never borrowed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker issue key (e.g., "CAM-1892").
    pub key: String,

    /// First day the campaign is live.
    pub start_date: NaiveDate,

    /// Last day the campaign is live.
    pub end_date: NaiveDate,

    /// Pixel identifiers attached to the ticket, in field order.
    pub pixels: Vec<String>,

    /// Profile ids attached to the ticket, paired with `pixels` by position.
    pub profile_ids: Vec<String>,

    /// Campaign manager's display name, mentioned in alert comments.
    pub manager: String,
}

impl Ticket {
    pub fn new(
        key: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        pixels: Vec<String>,
        profile_ids: Vec<String>,
        manager: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            start_date,
            end_date,
            pixels,
            profile_ids,
            manager: manager.into(),
        }
    }

    /// Whether the campaign is live on `date` (inclusive on both ends).
    pub fn live_at(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Total pixels on the ticket, for discovery accounting.
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// First pixel, used to key log trails for tickets that never split.
    pub fn first_pixel(&self) -> Option<&str> {
        self.pixels.first().map(String::as_str)
    }
}

/// One independently reportable slice of a ticket: a single pixel paired
/// with a single profile id.
///
/// Units own every field outright. Two units derived from the same ticket
/// share no state, so mutating one can never leak into a sibling that is
/// being queried concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingUnit {
    /// Parent ticket key.
    pub key: String,
    /// The one pixel this unit reports on.
    pub pixel: String,
    /// The profile id paired with the pixel.
    pub profile_id: String,
    /// Campaign start, copied from the parent.
    pub start_date: NaiveDate,
    /// Campaign end, copied from the parent.
    pub end_date: NaiveDate,
    /// Campaign manager, copied from the parent.
    pub manager: String,
}

impl ReportingUnit {
    /// Human-readable name stamped on the unit's engine job.
    pub fn job_name(&self) -> String {
        format!("{}, {}", self.key, self.pixel)
    }
}
