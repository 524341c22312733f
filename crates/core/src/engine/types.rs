//! Types for query engine operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during query engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Engine API error: {0}")]
    ApiError(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Request timeout")]
    Timeout,
}

/// Handle to a submitted query job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
}

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Lifecycle state of a query job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, not yet started.
    Waiting,
    /// Executing on the cluster.
    Running,
    /// Finished successfully, results available.
    Done,
    /// Finished with an error.
    Error,
    /// Cancelled before completion.
    Cancelled,
    /// Status string the API returned was not recognized.
    Unknown,
}

impl JobStatus {
    /// Parse the engine API's status string.
    pub fn parse(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "waiting" => JobStatus::Waiting,
            "running" => JobStatus::Running,
            "done" => JobStatus::Done,
            "error" => JobStatus::Error,
            "cancelled" | "canceled" => JobStatus::Cancelled,
            _ => JobStatus::Unknown,
        }
    }

    /// Returns the string representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Cancelled)
    }

    /// Whether the job finished with results to fetch.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Done)
    }
}

/// Decoded result row of one targeting-accuracy query.
///
/// Field order matches the query's select list; the whole row is immutable
/// once decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub total_impressions: u64,
    pub eligible_individuals: u64,
    pub ind_match_percent: f64,
    pub matched_individuals: u64,
    pub targeting_accuracy: f64,
}

/// Errors decoding the engine's tab-separated result row.
#[derive(Debug, Error)]
pub enum ResultDecodeError {
    #[error("Expected 5 tab-separated fields, got {0}")]
    FieldCount(usize),

    #[error("Field {field} is not numeric: '{value}'")]
    BadNumber { field: &'static str, value: String },
}

impl QueryResult {
    /// Decode the single tab-separated row the weekly query produces.
    pub fn parse_row(text: &str) -> Result<Self, ResultDecodeError> {
        let fields: Vec<&str> = text.trim().split('\t').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(ResultDecodeError::FieldCount(fields.len()));
        }

        Ok(Self {
            total_impressions: parse_count("TOTAL_IMPRESSIONS", fields[0])?,
            eligible_individuals: parse_count("ELIGIBLE_INDIVIDUALS", fields[1])?,
            ind_match_percent: parse_percent("IND_MATCH_PERCENT", fields[2])?,
            matched_individuals: parse_count("MATCHED_INDIVIDUALS", fields[3])?,
            targeting_accuracy: parse_percent("TARGETING_ACCURACY", fields[4])?,
        })
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.total_impressions,
            self.eligible_individuals,
            self.ind_match_percent,
            self.matched_individuals,
            self.targeting_accuracy
        )
    }
}

fn parse_count(field: &'static str, value: &str) -> Result<u64, ResultDecodeError> {
    // Counts normally arrive as plain integers; tolerate a float rendering.
    value
        .parse::<u64>()
        .or_else(|_| value.parse::<f64>().map(|v| v as u64))
        .map_err(|_| ResultDecodeError::BadNumber {
            field,
            value: value.to_string(),
        })
}

fn parse_percent(field: &'static str, value: &str) -> Result<f64, ResultDecodeError> {
    value
        .parse::<f64>()
        .map_err(|_| ResultDecodeError::BadNumber {
            field,
            value: value.to_string(),
        })
}

/// Trait for query execution backends.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Submit a query for execution; returns a handle to poll.
    async fn submit(&self, query: &str, label: &str, name: &str)
        -> Result<JobHandle, EngineError>;

    /// Fetch the current status of a submitted job.
    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, EngineError>;

    /// Fetch the raw result text of a successfully completed job.
    async fn fetch_results(&self, handle: &JobHandle) -> Result<String, EngineError>;
}
