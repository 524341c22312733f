//! Turns query outcomes into ticket comments and run log trails.

use std::sync::Arc;

use tracing::warn;

use crate::engine::QueryResult;
use crate::runlog::{RunEntry, RunKey, RunLogHandle};
use crate::ticket::{ReportingUnit, Ticket};
use crate::tracker::{accuracy_alert_comment, data_alert_comment, report_comment, Tracker};
use crate::window::ReportWindow;

/// How one reporting unit ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Results were posted to the ticket.
    Reported,
    /// Results were posted and the accuracy shortfall alert went with them.
    ReportedWithAlert,
    /// No result came back, so the ticket got a data alert instead.
    DataAlert,
}

/// Consumes per-unit query outcomes: posts the right comments on the ticket
/// and records what happened in the run log.
///
/// Comment posting is best-effort. A tracker fault is logged and noted in
/// the trail but never fails the unit; the batch keeps going.
pub struct ResultAggregator {
    tracker: Arc<dyn Tracker>,
    log: RunLogHandle,
    threshold_pct: f64,
    window: ReportWindow,
}

impl ResultAggregator {
    pub fn new(
        tracker: Arc<dyn Tracker>,
        log: RunLogHandle,
        threshold_pct: f64,
        window: ReportWindow,
    ) -> Self {
        Self {
            tracker,
            log,
            threshold_pct,
            window,
        }
    }

    /// Record one unit's outcome against its trail.
    pub async fn record(&self, unit: &ReportingUnit, outcome: Option<QueryResult>) -> UnitOutcome {
        let key = RunKey::for_unit(unit);
        self.log
            .append(key.clone(), RunEntry::Pixels(vec![unit.pixel.clone()]))
            .await;
        self.log
            .append(key.clone(), RunEntry::ProfileIds(vec![unit.profile_id.clone()]))
            .await;
        self.log
            .append(key.clone(), RunEntry::Outcome(outcome.clone()))
            .await;

        match outcome {
            Some(result) => self.report(unit, &key, &result).await,
            None => {
                self.post_data_alert(&unit.key, &unit.manager, &key).await;
                UnitOutcome::DataAlert
            }
        }
    }

    /// Record a ticket whose field data ruled out running any queries.
    /// The trail carries only the alert narrative.
    pub async fn record_invalid(&self, ticket: &Ticket) {
        let key = RunKey::for_ticket(ticket);
        self.post_data_alert(&ticket.key, &ticket.manager, &key).await;
    }

    async fn report(&self, unit: &ReportingUnit, key: &RunKey, result: &QueryResult) -> UnitOutcome {
        self.note(
            key,
            format!(
                "The reporting period is {} through {}",
                self.window.start_compact(),
                self.window.end_compact()
            ),
        )
        .await;

        let body = report_comment(&unit.pixel, result, &self.window);
        match self.tracker.post_comment(&unit.key, &body).await {
            Ok(()) => {
                self.note(
                    key,
                    format!(
                        "The query results have been added as a comment to ticket: {}",
                        unit.key
                    ),
                )
                .await;
            }
            Err(e) => {
                warn!(ticket = %unit.key, error = %e, "Failed to post the report comment");
                self.note(
                    key,
                    format!(
                        "The query results comment could not be added to ticket: {}",
                        unit.key
                    ),
                )
                .await;
            }
        }

        if result.targeting_accuracy < self.threshold_pct {
            let body = accuracy_alert_comment(&unit.manager, &unit.pixel, self.threshold_pct);
            match self.tracker.post_comment(&unit.key, &body).await {
                Ok(()) => {
                    self.note(
                        key,
                        format!(
                            "A targeting accuracy alert has been added as a comment to ticket: {}",
                            unit.key
                        ),
                    )
                    .await;
                }
                Err(e) => {
                    warn!(ticket = %unit.key, error = %e, "Failed to post the accuracy alert");
                    self.note(
                        key,
                        format!(
                            "A targeting accuracy alert could not be added to ticket: {}",
                            unit.key
                        ),
                    )
                    .await;
                }
            }
            UnitOutcome::ReportedWithAlert
        } else {
            UnitOutcome::Reported
        }
    }

    async fn post_data_alert(&self, ticket_key: &str, manager: &str, key: &RunKey) {
        let body = data_alert_comment(manager);
        match self.tracker.post_comment(ticket_key, &body).await {
            Ok(()) => {
                self.note(
                    key,
                    format!(
                        "A ticket alert has been added as a comment to ticket: {}",
                        ticket_key
                    ),
                )
                .await;
            }
            Err(e) => {
                warn!(ticket = %ticket_key, error = %e, "Failed to post the ticket data alert");
                self.note(
                    key,
                    format!("A ticket alert could not be added to ticket: {}", ticket_key),
                )
                .await;
            }
        }
    }

    async fn note(&self, key: &RunKey, note: String) {
        self.log.append(key.clone(), RunEntry::Note(note)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runlog::{create_run_log, RunLog};
    use crate::testing::mock_tracker::MockTracker;
    use chrono::NaiveDate;

    fn window() -> ReportWindow {
        ReportWindow {
            start: NaiveDate::from_ymd_opt(2024, 7, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 7, 11).unwrap(),
        }
    }

    fn unit() -> ReportingUnit {
        ReportingUnit {
            key: "CAM-1".to_string(),
            pixel: "100".to_string(),
            profile_id: "10".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            manager: "Jane Doe".to_string(),
        }
    }

    fn result(accuracy: f64) -> QueryResult {
        QueryResult {
            total_impressions: 101880,
            eligible_individuals: 80154,
            ind_match_percent: 78.68,
            matched_individuals: 48060,
            targeting_accuracy: accuracy,
        }
    }

    async fn run_one(
        tracker: Arc<MockTracker>,
        outcome: Option<QueryResult>,
    ) -> (UnitOutcome, RunLog) {
        let (handle, collector) = create_run_log(16);
        let collector_task = tokio::spawn(collector.run());
        let aggregator = ResultAggregator::new(tracker, handle, 45.0, window());

        let unit_outcome = aggregator.record(&unit(), outcome).await;
        drop(aggregator);

        (unit_outcome, collector_task.await.unwrap())
    }

    #[tokio::test]
    async fn test_healthy_result_posts_report_only() {
        let tracker = Arc::new(MockTracker::new());
        let (outcome, log) = run_one(tracker.clone(), Some(result(60.0))).await;

        assert_eq!(outcome, UnitOutcome::Reported);
        let comments = tracker.comments_for("CAM-1").await;
        assert_eq!(comments.len(), 1);
        assert!(comments[0].contains("|Targeting Accuracy|60.00%|"));

        let trail = log.trail(&RunKey::new("CAM-1", "100")).unwrap();
        assert_eq!(trail[0], RunEntry::Pixels(vec!["100".into()]));
        assert_eq!(trail[1], RunEntry::ProfileIds(vec!["10".into()]));
        assert_eq!(trail[2], RunEntry::Outcome(Some(result(60.0))));
        assert_eq!(
            trail[3],
            RunEntry::Note("The reporting period is 20240705 through 20240711".into())
        );
        assert_eq!(
            trail[4],
            RunEntry::Note("The query results have been added as a comment to ticket: CAM-1".into())
        );
        assert_eq!(trail.len(), 5);
    }

    #[tokio::test]
    async fn test_low_accuracy_adds_alert() {
        let tracker = Arc::new(MockTracker::new());
        let (outcome, log) = run_one(tracker.clone(), Some(result(42.0))).await;

        assert_eq!(outcome, UnitOutcome::ReportedWithAlert);
        let comments = tracker.comments_for("CAM-1").await;
        assert_eq!(comments.len(), 2);
        assert!(comments[1].starts_with("[~jane.doe]"));
        assert!(comments[1].contains("fallen below - 45%"));

        let trail = log.trail(&RunKey::new("CAM-1", "100")).unwrap();
        assert_eq!(
            trail.last().unwrap(),
            &RunEntry::Note(
                "A targeting accuracy alert has been added as a comment to ticket: CAM-1".into()
            )
        );
    }

    #[tokio::test]
    async fn test_accuracy_at_threshold_does_not_alert() {
        let tracker = Arc::new(MockTracker::new());
        let (outcome, _) = run_one(tracker.clone(), Some(result(45.0))).await;

        assert_eq!(outcome, UnitOutcome::Reported);
        assert_eq!(tracker.comment_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_result_posts_data_alert() {
        let tracker = Arc::new(MockTracker::new());
        let (outcome, log) = run_one(tracker.clone(), None).await;

        assert_eq!(outcome, UnitOutcome::DataAlert);
        let comments = tracker.comments_for("CAM-1").await;
        assert_eq!(comments.len(), 1);
        assert!(comments[0].starts_with("[~jane.doe]"));
        assert!(comments[0].contains("'Pixels' and 'Profile ID/s'"));

        let trail = log.trail(&RunKey::new("CAM-1", "100")).unwrap();
        assert_eq!(trail[2], RunEntry::Outcome(None));
        assert_eq!(
            trail[3],
            RunEntry::Note("A ticket alert has been added as a comment to ticket: CAM-1".into())
        );
    }

    #[tokio::test]
    async fn test_invalid_ticket_gets_alert_only_trail() {
        let tracker = Arc::new(MockTracker::new());
        let (handle, collector) = create_run_log(16);
        let collector_task = tokio::spawn(collector.run());
        let aggregator = ResultAggregator::new(tracker.clone(), handle, 45.0, window());

        let ticket = Ticket::new(
            "CAM-2",
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            vec!["200".into(), "201".into()],
            vec!["20".into()],
            "Jane Doe",
        );
        aggregator.record_invalid(&ticket).await;
        drop(aggregator);

        let log = collector_task.await.unwrap();
        let trail = log.trail(&RunKey::new("CAM-2", "200")).unwrap();
        assert_eq!(
            trail,
            &[RunEntry::Note(
                "A ticket alert has been added as a comment to ticket: CAM-2".into()
            )]
        );
        assert_eq!(tracker.comment_count().await, 1);
    }

    #[tokio::test]
    async fn test_post_failure_is_noted_not_fatal() {
        let tracker = Arc::new(MockTracker::new());
        tracker.fail_comments_for("CAM-1").await;
        let (outcome, log) = run_one(tracker.clone(), Some(result(42.0))).await;

        // The unit still classifies by its result; the trail records that
        // neither comment made it to the ticket.
        assert_eq!(outcome, UnitOutcome::ReportedWithAlert);
        assert_eq!(tracker.comment_count().await, 0);

        let trail = log.trail(&RunKey::new("CAM-1", "100")).unwrap();
        assert_eq!(
            trail[4],
            RunEntry::Note("The query results comment could not be added to ticket: CAM-1".into())
        );
        assert_eq!(
            trail[5],
            RunEntry::Note("A targeting accuracy alert could not be added to ticket: CAM-1".into())
        );
    }
}
