//! Types for the ticket tracker interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrackerConfig;
use crate::ticket::Ticket;

/// Filters applied when searching the tracker for reportable tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Projects searched (e.g., "CAM").
    pub projects: Vec<String>,
    /// Eligible issue types.
    pub issue_types: Vec<String>,
    /// Eligible ticket statuses.
    pub statuses: Vec<String>,
    /// Agencies whose campaigns are reported on.
    pub agencies: Vec<String>,
}

impl From<&TrackerConfig> for SearchFilter {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            projects: config.projects.clone(),
            issue_types: config.issue_types.clone(),
            statuses: config.statuses.clone(),
            agencies: config.agencies.clone(),
        }
    }
}

/// Errors that can occur during tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Tracker API error: {0}")]
    ApiError(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Ticket {key} field '{field}' is missing or malformed: {reason}")]
    MalformedField {
        key: String,
        field: String,
        reason: String,
    },

    #[error("Request timeout")]
    Timeout,
}

/// Trait for ticket tracker backends.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search for ticket keys matching the filter.
    async fn find_items(&self, filter: &SearchFilter) -> Result<Vec<String>, TrackerError>;

    /// Fetch the report-relevant fields of one ticket.
    async fn fetch_fields(&self, key: &str) -> Result<Ticket, TrackerError>;

    /// Post a comment on a ticket.
    async fn post_comment(&self, key: &str, body: &str) -> Result<(), TrackerError>;
}
