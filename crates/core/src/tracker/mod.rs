//! Ticket tracker interface and Jira implementation.

mod comment;
mod jira;
mod types;

pub use comment::{accuracy_alert_comment, data_alert_comment, report_comment};
pub use jira::JiraTracker;
pub use types::{SearchFilter, Tracker, TrackerError};
