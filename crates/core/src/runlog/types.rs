//! Run log data types.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use crate::engine::QueryResult;
use crate::ticket::{ReportingUnit, Ticket};

/// Identifies one trail in the run log: a ticket key paired with the pixel
/// the trail reports on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub key: String,
    pub pixel: String,
}

impl RunKey {
    pub fn new(key: impl Into<String>, pixel: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            pixel: pixel.into(),
        }
    }

    pub fn for_unit(unit: &ReportingUnit) -> Self {
        Self::new(unit.key.clone(), unit.pixel.clone())
    }

    /// Key for a ticket that never produced units. Tickets rejected for bad
    /// field data may have no pixels at all, so the pixel slot falls back to
    /// a placeholder.
    pub fn for_ticket(ticket: &Ticket) -> Self {
        Self::new(ticket.key.clone(), ticket.first_pixel().unwrap_or("-"))
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.key, self.pixel)
    }
}

/// One fact recorded against a trail.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEntry {
    /// Pixels the trail covers.
    Pixels(Vec<String>),
    /// Profile ids paired with those pixels.
    ProfileIds(Vec<String>),
    /// What the query produced, if anything.
    Outcome(Option<QueryResult>),
    /// A narrative line, e.g. which comment was posted where.
    Note(String),
}

/// The finished record of everything one run did, ordered by when each
/// trail first appeared.
#[derive(Debug, Default)]
pub struct RunLog {
    trails: HashMap<RunKey, Vec<RunEntry>>,
    order: Vec<RunKey>,
}

impl RunLog {
    pub(crate) fn push(&mut self, key: RunKey, entry: RunEntry) {
        match self.trails.entry(key) {
            Entry::Occupied(mut e) => e.get_mut().push(entry),
            Entry::Vacant(e) => {
                self.order.push(e.key().clone());
                e.insert(vec![entry]);
            }
        }
    }

    /// Trail keys in first-arrival order.
    pub fn keys(&self) -> impl Iterator<Item = &RunKey> {
        self.order.iter()
    }

    pub fn trail(&self, key: &RunKey) -> Option<&[RunEntry]> {
        self.trails.get(key).map(Vec::as_slice)
    }

    pub fn trail_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Render the whole log as the consolidated end-of-run summary block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for key in &self.order {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("Ticket Number => {}\n", key.key));

            let mut notes = Vec::new();
            for entry in &self.trails[key] {
                match entry {
                    RunEntry::Pixels(pixels) => {
                        out.push_str(&format!("     => Pixel: {}\n", pixels.join(", ")));
                    }
                    RunEntry::ProfileIds(ids) => {
                        out.push_str(&format!("     => Profile IDs: {}\n", ids.join(", ")));
                    }
                    RunEntry::Outcome(Some(result)) => {
                        out.push_str(&format!("     => Query Results: {}\n", result));
                    }
                    RunEntry::Outcome(None) => {
                        out.push_str("     => Query Results: no results were returned\n");
                    }
                    RunEntry::Note(note) => notes.push(note.as_str()),
                }
            }

            out.push_str("     => Ticket Comments:\n");
            for note in notes {
                out.push_str(&format!("        {}\n", note));
            }
        }
        out
    }
}
