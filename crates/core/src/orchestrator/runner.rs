//! Drives one weekly report run end to end.
//!
//! The orchestrator owns the run's sequencing: compute the window, discover
//! tickets, fan the batch out to the scheduler, then render the consolidated
//! run log once every worker has finished. It does not talk to the engine or
//! post comments itself; those live behind the [`QueryRunner`] and
//! [`ResultAggregator`] it wires together.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregator::ResultAggregator;
use crate::config::Config;
use crate::engine::QueryEngine;
use crate::query::QueryRunner;
use crate::runlog::{create_run_log, RunLog};
use crate::scheduler::{default_pool_size, FanOutScheduler};
use crate::ticket::Ticket;
use crate::tracker::{SearchFilter, Tracker};
use crate::window::ReportWindow;

use super::types::{OrchestratorError, RunSummary};

/// Run log channel capacity. Appends are tiny and the collector only falls
/// behind while the final render is being built, so a small buffer is enough.
const RUN_LOG_BUFFER: usize = 256;

/// Coordinates one run of the weekly targeting accuracy report.
pub struct ReportOrchestrator {
    config: Config,
    tracker: Arc<dyn Tracker>,
    engine: Arc<dyn QueryEngine>,
}

impl ReportOrchestrator {
    pub fn new(config: Config, tracker: Arc<dyn Tracker>, engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            config,
            tracker,
            engine,
        }
    }

    /// Execute the report for the week implied by `today`.
    ///
    /// Fails only when the window cannot be computed or discovery itself
    /// errors; everything after discovery degrades into summary counts so a
    /// single bad ticket cannot sink the batch.
    pub async fn run(&self, today: NaiveDate) -> Result<RunSummary, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("report_run", run_id = %run_id);
        self.run_inner(run_id, today).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        today: NaiveDate,
    ) -> Result<RunSummary, OrchestratorError> {
        let window = ReportWindow::for_run_date(today)?;
        info!(
            "The reporting period is {} through {}",
            window.start_compact(),
            window.end_compact()
        );

        let filter = SearchFilter::from(&self.config.tracker);
        let keys = self.tracker.find_items(&filter).await?;
        if keys.is_empty() {
            warn!("There were no tickets found with the required criteria to report on.");
            return Ok(RunSummary::empty(run_id, window));
        }

        let mut tickets: Vec<Ticket> = Vec::with_capacity(keys.len());
        let mut fetch_failures: u64 = 0;
        let mut pixels_total: u64 = 0;
        for key in &keys {
            match self.tracker.fetch_fields(key).await {
                Ok(ticket) => {
                    pixels_total += ticket.pixel_count() as u64;
                    tickets.push(ticket);
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Could not pull the fields for the ticket");
                    fetch_failures += 1;
                }
            }
        }

        info!(
            "{} ticket(s) were found with a total of {} pixel(s).",
            tickets.len(),
            pixels_total
        );
        let scoped: Vec<&str> = tickets.iter().map(|t| t.key.as_str()).collect();
        info!("Tickets in scope: {:?}", scoped);

        let (log_handle, collector) = create_run_log(RUN_LOG_BUFFER);
        let collector_task = tokio::spawn(collector.run());

        let pool_size = self
            .config
            .report
            .pool_size
            .unwrap_or_else(default_pool_size);
        let runner = Arc::new(QueryRunner::new(
            Arc::clone(&self.engine),
            &self.config.engine,
        ));
        let aggregator = Arc::new(ResultAggregator::new(
            Arc::clone(&self.tracker),
            log_handle,
            self.config.report.accuracy_threshold_pct,
            window,
        ));
        let scheduler = FanOutScheduler::new(runner, aggregator, window, pool_size);

        let batch = scheduler.run_batch(tickets).await;

        // The scheduler holds the last strong reference to the aggregator and
        // with it the log appender. Dropping it closes the channel so the
        // collector can hand the finished log back.
        drop(scheduler);
        let log = match collector_task.await {
            Ok(log) => log,
            Err(e) => {
                error!(error = %e, "The run log collector died; the summary is lost");
                RunLog::default()
            }
        };
        if !log.is_empty() {
            info!("Run results:\n{}", log.render());
        }

        info!(
            tickets_processed = batch.tickets_processed,
            units_reported = batch.units_reported,
            accuracy_alerts = batch.accuracy_alerts,
            data_alerts = batch.data_alerts,
            faults = batch.faults,
            "Report run complete"
        );

        Ok(RunSummary {
            run_id,
            window,
            tickets_found: keys.len() as u64,
            pixels_total,
            fetch_failures,
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::testing::mock_engine::MockQueryEngine;
    use crate::testing::mock_tracker::MockTracker;
    use crate::tracker::TrackerError;

    fn config() -> Config {
        load_config_from_str(
            r#"
[tracker]
url = "https://jira.example.com"
username = "svc-report"
token = "secret"
issue_types = ["Campaign"]
statuses = ["Fulfilled"]
agencies = ["Acme"]

[engine]
token = "qb-secret"
cluster_label = "hive-prod"
poll_interval_secs = 0
max_attempts = 1

[report]
pool_size = 2
"#,
        )
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-07-12 is a Friday; the window is 2024-07-05 through 2024-07-11.
    fn friday() -> NaiveDate {
        date(2024, 7, 12)
    }

    fn live_ticket(key: &str) -> Ticket {
        Ticket::new(
            key,
            date(2024, 7, 1),
            date(2024, 7, 31),
            vec!["100".to_string()],
            vec!["10".to_string()],
            "Jane Doe",
        )
    }

    fn orchestrator(
        tracker: &Arc<MockTracker>,
        engine: &Arc<MockQueryEngine>,
    ) -> ReportOrchestrator {
        ReportOrchestrator::new(
            config(),
            Arc::clone(tracker) as Arc<dyn Tracker>,
            Arc::clone(engine) as Arc<dyn QueryEngine>,
        )
    }

    #[tokio::test]
    async fn test_run_reports_on_discovered_tickets() {
        let tracker = Arc::new(MockTracker::new());
        let engine = Arc::new(MockQueryEngine::new());
        tracker.add_ticket(live_ticket("CAM-1")).await;

        let summary = orchestrator(&tracker, &engine)
            .run(friday())
            .await
            .unwrap();

        assert_eq!(summary.tickets_found, 1);
        assert_eq!(summary.pixels_total, 1);
        assert_eq!(summary.fetch_failures, 0);
        assert_eq!(summary.batch.tickets_processed, 1);
        assert_eq!(summary.batch.units_reported, 1);
        assert_eq!(summary.batch.accuracy_alerts, 0);
        assert_eq!(summary.batch.faults, 0);

        let comments = tracker.comments_for("CAM-1").await;
        assert_eq!(comments.len(), 1);
        assert!(comments[0].contains("|Pixel|100|"));
        assert!(comments[0].contains("20240705  thru  20240711"));
    }

    #[tokio::test]
    async fn test_run_with_no_matching_tickets() {
        let tracker = Arc::new(MockTracker::new());
        let engine = Arc::new(MockQueryEngine::new());

        let summary = orchestrator(&tracker, &engine)
            .run(friday())
            .await
            .unwrap();

        assert_eq!(summary.tickets_found, 0);
        assert_eq!(summary.batch.tickets_processed, 0);
        assert_eq!(engine.submission_count().await, 0);
        assert_eq!(tracker.comment_count().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_only_that_ticket() {
        let tracker = Arc::new(MockTracker::new());
        let engine = Arc::new(MockQueryEngine::new());
        tracker.add_ticket(live_ticket("CAM-1")).await;
        tracker.push_key("CAM-404").await;

        let summary = orchestrator(&tracker, &engine)
            .run(friday())
            .await
            .unwrap();

        assert_eq!(summary.tickets_found, 2);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.batch.tickets_processed, 1);
        assert_eq!(summary.batch.units_reported, 1);
        assert_eq!(tracker.comment_count().await, 1);
    }

    #[tokio::test]
    async fn test_run_on_a_weekday_is_refused() {
        let tracker = Arc::new(MockTracker::new());
        let engine = Arc::new(MockQueryEngine::new());

        // 2024-07-15 is a Monday.
        let result = orchestrator(&tracker, &engine).run(date(2024, 7, 15)).await;

        assert!(matches!(result, Err(OrchestratorError::InvalidRunDay(_))));
        assert_eq!(engine.submission_count().await, 0);
    }

    #[tokio::test]
    async fn test_discovery_failure_aborts_the_run() {
        let tracker = Arc::new(MockTracker::new());
        let engine = Arc::new(MockQueryEngine::new());
        tracker
            .set_next_error(TrackerError::ConnectionFailed("refused".to_string()))
            .await;

        let result = orchestrator(&tracker, &engine).run(friday()).await;

        assert!(matches!(result, Err(OrchestratorError::Discovery(_))));
        assert_eq!(engine.submission_count().await, 0);
    }
}
