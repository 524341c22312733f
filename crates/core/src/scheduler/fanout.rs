//! Two-tier bounded fan-out over tickets and their reporting units.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::aggregator::{ResultAggregator, UnitOutcome};
use crate::query::QueryRunner;
use crate::ticket::{split_ticket, ReportingUnit, Ticket};
use crate::window::ReportWindow;

use super::types::{BatchSummary, TicketOutcome};

/// Runs a batch of tickets through the report pipeline.
///
/// Tickets fan out on one bounded pool; a ticket that splits into several
/// units fans those out on a second pool of its own. Every task failure is
/// absorbed where it lands, so one bad ticket or unit never takes a sibling
/// with it.
pub struct FanOutScheduler {
    runner: Arc<QueryRunner>,
    aggregator: Arc<ResultAggregator>,
    window: ReportWindow,
    pool_size: usize,
}

impl FanOutScheduler {
    pub fn new(
        runner: Arc<QueryRunner>,
        aggregator: Arc<ResultAggregator>,
        window: ReportWindow,
        pool_size: usize,
    ) -> Self {
        Self {
            runner,
            aggregator,
            window,
            pool_size: pool_size.max(1),
        }
    }

    /// Process every ticket in the batch and fold the outcomes into one
    /// summary. Infallible by design: faults show up in the counts.
    pub async fn run_batch(&self, tickets: Vec<Ticket>) -> BatchSummary {
        info!("Beginning the ticket level concurrent processing.");

        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks: Vec<JoinHandle<TicketOutcome>> = Vec::with_capacity(tickets.len());
        let mut summary = BatchSummary::default();

        let mut tickets = tickets.into_iter();
        for ticket in tickets.by_ref() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!(
                        ticket = %ticket.key,
                        "Ticket pool closed unexpectedly, abandoning the remaining tickets"
                    );
                    summary.faults += 1;
                    break;
                }
            };

            let runner = Arc::clone(&self.runner);
            let aggregator = Arc::clone(&self.aggregator);
            let window = self.window;
            let pool_size = self.pool_size;
            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                process_ticket(ticket, runner, aggregator, window, pool_size).await
            }));
        }
        drop(tickets);

        for joined in join_all(tasks).await {
            match joined {
                Ok(outcome) => summary.absorb(outcome),
                Err(e) => {
                    error!(error = %e, "A ticket task died before finishing");
                    summary.faults += 1;
                }
            }
        }

        info!("Finished the ticket level concurrent processing.");
        summary
    }
}

async fn process_ticket(
    ticket: Ticket,
    runner: Arc<QueryRunner>,
    aggregator: Arc<ResultAggregator>,
    window: ReportWindow,
    pool_size: usize,
) -> TicketOutcome {
    if !ticket.live_at(window.end) {
        warn!(
            "This ticket does not match the report-date criteria: {}",
            ticket.key
        );
        return TicketOutcome::Skipped;
    }

    let mut units = match split_ticket(&ticket) {
        Ok(units) => units,
        Err(e) => {
            warn!(
                error = %e,
                "This ticket is missing data required for report generation: {}", ticket.key
            );
            aggregator.record_invalid(&ticket).await;
            return TicketOutcome::Invalid;
        }
    };

    // A one-pixel ticket runs inline; only multi-pixel tickets earn a
    // second pool.
    if units.len() == 1 {
        let unit = units.remove(0);
        let outcome = process_unit(unit, runner, aggregator, window).await;
        return TicketOutcome::Processed {
            outcomes: vec![outcome],
            faults: 0,
        };
    }

    fan_out_units(units, runner, aggregator, window, pool_size).await
}

/// Tier two: a multi-pixel ticket gets its own bounded pool so its units
/// run concurrently without starving other tickets' pools.
async fn fan_out_units(
    units: Vec<ReportingUnit>,
    runner: Arc<QueryRunner>,
    aggregator: Arc<ResultAggregator>,
    window: ReportWindow,
    pool_size: usize,
) -> TicketOutcome {
    let semaphore = Arc::new(Semaphore::new(pool_size));
    let mut tasks: Vec<JoinHandle<UnitOutcome>> = Vec::with_capacity(units.len());
    let mut faults = 0u64;

    let mut units = units.into_iter();
    for unit in units.by_ref() {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!(
                    unit = %unit.job_name(),
                    "Pixel pool closed unexpectedly, abandoning the remaining pixels"
                );
                faults += 1;
                break;
            }
        };

        let runner = Arc::clone(&runner);
        let aggregator = Arc::clone(&aggregator);
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            process_unit(unit, runner, aggregator, window).await
        }));
    }
    drop(units);

    let mut outcomes = Vec::with_capacity(tasks.len());
    for joined in join_all(tasks).await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!(error = %e, "A pixel task died before finishing");
                faults += 1;
            }
        }
    }

    TicketOutcome::Processed { outcomes, faults }
}

async fn process_unit(
    unit: ReportingUnit,
    runner: Arc<QueryRunner>,
    aggregator: Arc<ResultAggregator>,
    window: ReportWindow,
) -> UnitOutcome {
    let result = runner.run(&unit, &window).await;
    aggregator.record(&unit, result).await
}
