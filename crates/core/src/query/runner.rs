//! Drives a single reporting unit's query to a usable result.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::{EngineError, JobHandle, JobStatus, QueryEngine, QueryResult};
use crate::ticket::ReportingUnit;
use crate::window::ReportWindow;

use super::template::weekly_query;

/// Executes one unit's weekly query against the engine, resubmitting when a
/// job ends without success.
///
/// Every failure mode collapses to `None`: a unit with no result takes the
/// alert path instead of failing its batch. Transport faults abort the unit
/// immediately; an unsuccessful terminal status burns one attempt and the
/// query is resubmitted, up to the configured attempt limit.
pub struct QueryRunner {
    engine: Arc<dyn QueryEngine>,
    cluster_label: String,
    poll_interval: Duration,
    poll_timeout: Duration,
    max_attempts: u32,
}

impl QueryRunner {
    pub fn new(engine: Arc<dyn QueryEngine>, config: &EngineConfig) -> Self {
        Self {
            engine,
            cluster_label: config.cluster_label.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Run the unit's query to completion. `None` means there is nothing to
    /// report for this unit.
    pub async fn run(&self, unit: &ReportingUnit, window: &ReportWindow) -> Option<QueryResult> {
        let query = weekly_query(&unit.pixel, &unit.profile_id, window);
        let name = unit.job_name();

        for attempt in 1..=self.max_attempts {
            let handle = match self
                .engine
                .submit(&query, &self.cluster_label, &name)
                .await
            {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(unit = %name, error = %e, "Query submission failed");
                    return None;
                }
            };
            debug!(unit = %name, job_id = %handle.id, attempt, "Query submitted");

            match self.watch(&handle, &name).await {
                Ok(Some(status)) if status.is_success() => {
                    return self.collect(&handle, &name).await;
                }
                Ok(Some(status)) => {
                    warn!(
                        unit = %name,
                        attempt,
                        status = status.as_str(),
                        "Query ended without success"
                    );
                }
                Ok(None) => {
                    warn!(unit = %name, attempt, "Gave up waiting for the query to finish");
                }
                Err(e) => {
                    warn!(unit = %name, error = %e, "Lost contact with the query engine");
                    return None;
                }
            }
        }

        warn!(
            unit = %name,
            attempts = self.max_attempts,
            "All query attempts used up with no result"
        );
        None
    }

    /// Poll the job until it reaches a terminal status. `Ok(None)` means the
    /// per-attempt waiting cap was hit before the job settled.
    async fn watch(&self, handle: &JobHandle, name: &str) -> Result<Option<JobStatus>, EngineError> {
        let deadline = Instant::now() + self.poll_timeout;
        loop {
            let status = self.engine.poll(handle).await?;
            if status.is_terminal() {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            debug!(
                unit = %name,
                job_id = %handle.id,
                status = status.as_str(),
                "Query still in progress"
            );
            sleep(self.poll_interval).await;
        }
    }

    async fn collect(&self, handle: &JobHandle, name: &str) -> Option<QueryResult> {
        let raw = match self.engine.fetch_results(handle).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(unit = %name, error = %e, "Failed to download query results");
                return None;
            }
        };
        match QueryResult::parse_row(&raw) {
            Ok(result) => {
                debug!(unit = %name, %result, "Query finished");
                Some(result)
            }
            Err(e) => {
                warn!(unit = %name, error = %e, "Query results could not be decoded");
                None
            }
        }
    }
}
