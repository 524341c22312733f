use tokio::sync::mpsc;

use super::{RunEntry, RunKey, RunLog};

/// Handle for appending run log entries.
///
/// This is cheaply cloneable and can be shared across tasks. Entries are
/// sent through an async channel to the collector task that owns the log.
#[derive(Clone)]
pub struct RunLogHandle {
    tx: mpsc::Sender<(RunKey, RunEntry)>,
}

impl RunLogHandle {
    pub fn new(tx: mpsc::Sender<(RunKey, RunEntry)>) -> Self {
        Self { tx }
    }

    /// Append one entry to `key`'s trail.
    ///
    /// Never fails the caller. If the collector is gone the entry is logged
    /// and dropped.
    pub async fn append(&self, key: RunKey, entry: RunEntry) {
        if let Err(e) = self.tx.send((key, entry)).await {
            tracing::error!("Failed to record run log entry: {}", e);
        }
    }
}

/// Background task that receives entries and folds them into the log.
pub struct RunLogCollector {
    rx: mpsc::Receiver<(RunKey, RunEntry)>,
}

impl RunLogCollector {
    pub fn new(rx: mpsc::Receiver<(RunKey, RunEntry)>) -> Self {
        Self { rx }
    }

    /// Consume entries until every handle has been dropped, then hand back
    /// the finished log.
    ///
    /// Spawn this as a background task with `tokio::spawn(collector.run())`
    /// and await the join handle after dropping all appenders.
    pub async fn run(mut self) -> RunLog {
        let mut log = RunLog::default();
        while let Some((key, entry)) = self.rx.recv().await {
            log.push(key, entry);
        }
        log
    }
}

/// Create a complete run log system.
///
/// Returns:
/// - `RunLogHandle` - for appending entries (clone this to share across tasks)
/// - `RunLogCollector` - spawn this as a background task
pub fn create_run_log(buffer_size: usize) -> (RunLogHandle, RunLogCollector) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (RunLogHandle::new(tx), RunLogCollector::new(rx))
}
