//! Mock query engine for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::{EngineError, JobHandle, JobStatus, QueryEngine};

/// Result row handed back by unscripted jobs. The accuracy of 47.17 sits
/// above the default alert threshold, so an unscripted job reads as healthy.
pub const DEFAULT_RESULT_ROW: &str = "101880\t80154\t78.68\t48060\t47.17";

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    /// The full query text that was submitted.
    pub query: String,
    /// The cluster label it was submitted to.
    pub label: String,
    /// The job name it was submitted under.
    pub name: String,
}

/// Scripted behavior for one submitted job.
///
/// Scripts are queued per job name with [`MockQueryEngine::push_script`] and
/// consumed in order, one per submission. A job that was never scripted
/// succeeds immediately with [`DEFAULT_RESULT_ROW`].
#[derive(Debug, Clone)]
pub struct JobScript {
    submit_error: Option<String>,
    panic_on_submit: bool,
    /// Statuses returned by successive polls; the last one repeats.
    statuses: Vec<JobStatus>,
    /// Error returned by the first poll after submission.
    poll_error: Option<String>,
    /// Text returned by `fetch_results`, or the error it fails with.
    results: Result<String, String>,
}

impl JobScript {
    fn with_statuses(statuses: Vec<JobStatus>) -> Self {
        Self {
            submit_error: None,
            panic_on_submit: false,
            statuses,
            poll_error: None,
            results: Ok(DEFAULT_RESULT_ROW.to_string()),
        }
    }

    /// Job completes on the first poll and serves `row` as its result.
    pub fn success(row: &str) -> Self {
        let mut script = Self::with_statuses(vec![JobStatus::Done]);
        script.results = Ok(row.to_string());
        script
    }

    /// Job runs for `polls` polls before completing with `row`.
    pub fn success_after(polls: usize, row: &str) -> Self {
        let mut statuses = vec![JobStatus::Running; polls];
        statuses.push(JobStatus::Done);
        let mut script = Self::with_statuses(statuses);
        script.results = Ok(row.to_string());
        script
    }

    /// Job reaches the given terminal status on the first poll.
    pub fn ended(status: JobStatus) -> Self {
        Self::with_statuses(vec![status])
    }

    /// Job ends in the error state on the first poll.
    pub fn failed() -> Self {
        Self::ended(JobStatus::Error)
    }

    /// Job never leaves the running state.
    pub fn stuck() -> Self {
        Self::with_statuses(vec![JobStatus::Running])
    }

    /// Submission itself fails; the script is consumed without creating a job.
    pub fn submit_error(message: &str) -> Self {
        let mut script = Self::with_statuses(vec![JobStatus::Running]);
        script.submit_error = Some(message.to_string());
        script
    }

    /// The first poll after submission fails with a transport error.
    pub fn poll_error(message: &str) -> Self {
        let mut script = Self::with_statuses(vec![JobStatus::Running]);
        script.poll_error = Some(message.to_string());
        script
    }

    /// Job completes but its results cannot be downloaded.
    pub fn fetch_error(message: &str) -> Self {
        let mut script = Self::with_statuses(vec![JobStatus::Done]);
        script.results = Err(message.to_string());
        script
    }

    /// Submission panics, killing the task that made it.
    pub fn panicking() -> Self {
        let mut script = Self::with_statuses(vec![JobStatus::Running]);
        script.panic_on_submit = true;
        script
    }
}

impl Default for JobScript {
    fn default() -> Self {
        Self::success(DEFAULT_RESULT_ROW)
    }
}

/// One submitted job being polled.
#[derive(Debug)]
struct ActiveJob {
    statuses: Vec<JobStatus>,
    polls_done: usize,
    poll_error: Option<String>,
    results: Result<String, String>,
}

/// Mock implementation of the QueryEngine trait.
///
/// Provides controllable behavior for testing:
/// - Script job lifecycles per job name
/// - Track submissions for assertions
/// - Simulate submit, poll and fetch failures
///
/// # Example
///
/// ```rust,ignore
/// use scorecard_core::testing::mock_engine::{JobScript, MockQueryEngine};
///
/// let engine = MockQueryEngine::new();
///
/// // First submission for this name fails, the retry succeeds
/// engine.push_script("CAM-1, 100", JobScript::failed()).await;
/// engine.push_script("CAM-1, 100", JobScript::success("1\t2\t3.0\t4\t5.0")).await;
///
/// // ... run the code under test ...
///
/// assert_eq!(engine.submission_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockQueryEngine {
    /// Scripts queued per job name, consumed one per submission.
    scripts: Arc<RwLock<HashMap<String, VecDeque<JobScript>>>>,
    /// Jobs created by successful submissions, keyed by job id.
    jobs: Arc<RwLock<HashMap<String, ActiveJob>>>,
    /// Recorded submissions.
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    /// Next job id.
    next_id: Arc<RwLock<u64>>,
}

impl Default for MockQueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockQueryEngine {
    /// Create a new mock engine with no scripts.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            submissions: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Queue a script for the next submission under `name`.
    pub async fn push_script(&self, name: &str, script: JobScript) {
        self.scripts
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .push_back(script);
    }

    /// Get recorded submissions.
    pub async fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Get the number of submissions made.
    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }

    /// Take the next script queued under `name`, if any.
    async fn take_script(&self, name: &str) -> Option<JobScript> {
        self.scripts.write().await.get_mut(name)?.pop_front()
    }
}

#[async_trait]
impl QueryEngine for MockQueryEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(
        &self,
        query: &str,
        label: &str,
        name: &str,
    ) -> Result<JobHandle, EngineError> {
        let script = self.take_script(name).await.unwrap_or_default();

        if script.panic_on_submit {
            panic!("Scripted panic for job '{name}'");
        }
        if let Some(message) = script.submit_error {
            return Err(EngineError::ConnectionFailed(message));
        }

        // Record the submission
        self.submissions.write().await.push(RecordedSubmission {
            query: query.to_string(),
            label: label.to_string(),
            name: name.to_string(),
        });

        let id = {
            let mut next = self.next_id.write().await;
            let id = format!("job-{}", *next);
            *next += 1;
            id
        };
        self.jobs.write().await.insert(
            id.clone(),
            ActiveJob {
                statuses: script.statuses,
                polls_done: 0,
                poll_error: script.poll_error,
                results: script.results,
            },
        );

        Ok(JobHandle::new(id))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, EngineError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&handle.id)
            .ok_or_else(|| EngineError::JobNotFound(handle.id.clone()))?;

        if let Some(message) = job.poll_error.take() {
            return Err(EngineError::ApiError(message));
        }

        let index = job.polls_done.min(job.statuses.len() - 1);
        job.polls_done += 1;
        Ok(job.statuses[index])
    }

    async fn fetch_results(&self, handle: &JobHandle) -> Result<String, EngineError> {
        let jobs = self.jobs.read().await;
        let job = jobs
            .get(&handle.id)
            .ok_or_else(|| EngineError::JobNotFound(handle.id.clone()))?;

        match &job.results {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(EngineError::ApiError(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_job_succeeds() {
        let engine = MockQueryEngine::new();

        let handle = engine.submit("select 1", "label", "anything").await.unwrap();
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Done);
        assert_eq!(
            engine.fetch_results(&handle).await.unwrap(),
            DEFAULT_RESULT_ROW
        );
    }

    #[tokio::test]
    async fn test_scripts_consumed_in_order() {
        let engine = MockQueryEngine::new();
        engine.push_script("job", JobScript::failed()).await;
        engine.push_script("job", JobScript::success("1\t2\t3.0\t4\t5.0")).await;

        let first = engine.submit("q", "l", "job").await.unwrap();
        assert_eq!(engine.poll(&first).await.unwrap(), JobStatus::Error);

        let second = engine.submit("q", "l", "job").await.unwrap();
        assert_eq!(engine.poll(&second).await.unwrap(), JobStatus::Done);
        assert_eq!(engine.fetch_results(&second).await.unwrap(), "1\t2\t3.0\t4\t5.0");
    }

    #[tokio::test]
    async fn test_submit_error_creates_no_job() {
        let engine = MockQueryEngine::new();
        engine.push_script("job", JobScript::submit_error("refused")).await;

        let result = engine.submit("q", "l", "job").await;
        assert!(result.is_err());
        assert_eq!(engine.submission_count().await, 0);

        // Error script consumed; the next submission falls back to the default
        let handle = engine.submit("q", "l", "job").await.unwrap();
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Done);
        assert_eq!(engine.submission_count().await, 1);
    }

    #[tokio::test]
    async fn test_poll_drains_statuses_then_repeats_last() {
        let engine = MockQueryEngine::new();
        engine.push_script("job", JobScript::success_after(2, DEFAULT_RESULT_ROW)).await;

        let handle = engine.submit("q", "l", "job").await.unwrap();
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Running);
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Running);
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Done);
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Done);
    }

    #[tokio::test]
    async fn test_poll_error_fires_once() {
        let engine = MockQueryEngine::new();
        engine.push_script("job", JobScript::poll_error("gateway timeout")).await;

        let handle = engine.submit("q", "l", "job").await.unwrap();
        assert!(engine.poll(&handle).await.is_err());
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Running);
    }

    #[tokio::test]
    async fn test_fetch_error() {
        let engine = MockQueryEngine::new();
        engine.push_script("job", JobScript::fetch_error("results expired")).await;

        let handle = engine.submit("q", "l", "job").await.unwrap();
        assert_eq!(engine.poll(&handle).await.unwrap(), JobStatus::Done);
        assert!(engine.fetch_results(&handle).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_handle_is_rejected() {
        let engine = MockQueryEngine::new();
        let bogus = JobHandle::new("job-999");

        assert!(engine.poll(&bogus).await.is_err());
        assert!(engine.fetch_results(&bogus).await.is_err());
    }
}
