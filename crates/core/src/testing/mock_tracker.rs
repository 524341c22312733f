//! Mock ticket tracker for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ticket::Ticket;
use crate::tracker::{SearchFilter, Tracker, TrackerError};

/// A recorded comment for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedComment {
    /// Ticket the comment was posted on.
    pub key: String,
    /// Full comment body.
    pub body: String,
}

/// Mock implementation of the Tracker trait.
///
/// Provides controllable behavior for testing:
/// - Register tickets that discovery returns and field pulls resolve
/// - Track posted comments for assertions
/// - Simulate search failures and comment rejections
///
/// # Example
///
/// ```rust,ignore
/// use scorecard_core::testing::mock_tracker::MockTracker;
///
/// let tracker = MockTracker::new();
/// tracker.add_ticket(ticket).await;
///
/// // A key discovery returns but whose field pull fails
/// tracker.push_key("CAM-404").await;
///
/// // ... run the code under test ...
///
/// let comments = tracker.comments_for("CAM-1").await;
/// assert!(comments[0].contains("|Pixel|100|"));
/// ```
#[derive(Debug)]
pub struct MockTracker {
    /// Keys discovery returns, in registration order.
    keys: Arc<RwLock<Vec<String>>>,
    /// Tickets resolvable by `fetch_fields`.
    tickets: Arc<RwLock<HashMap<String, Ticket>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<SearchFilter>>>,
    /// Recorded comments.
    comments: Arc<RwLock<Vec<RecordedComment>>>,
    /// Keys whose comment posts are rejected.
    failing_comments: Arc<RwLock<HashSet<String>>>,
    /// If set, the next tracker call will fail with this error.
    next_error: Arc<RwLock<Option<TrackerError>>>,
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTracker {
    /// Create a new mock tracker with no tickets.
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(Vec::new())),
            tickets: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            comments: Arc::new(RwLock::new(Vec::new())),
            failing_comments: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a ticket: discovery returns its key and field pulls resolve it.
    pub async fn add_ticket(&self, ticket: Ticket) {
        self.keys.write().await.push(ticket.key.clone());
        self.tickets.write().await.insert(ticket.key.clone(), ticket);
    }

    /// Register a key that discovery returns but whose field pull fails.
    pub async fn push_key(&self, key: &str) {
        self.keys.write().await.push(key.to_string());
    }

    /// Configure the next tracker call to fail with the given error.
    pub async fn set_next_error(&self, error: TrackerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Reject every comment posted on `key` from now on.
    pub async fn fail_comments_for(&self, key: &str) {
        self.failing_comments.write().await.insert(key.to_string());
    }

    /// Get recorded searches.
    pub async fn recorded_searches(&self) -> Vec<SearchFilter> {
        self.searches.read().await.clone()
    }

    /// Get all recorded comments.
    pub async fn recorded_comments(&self) -> Vec<RecordedComment> {
        self.comments.read().await.clone()
    }

    /// Get the bodies of comments posted on `key`, in posting order.
    pub async fn comments_for(&self, key: &str) -> Vec<String> {
        self.comments
            .read()
            .await
            .iter()
            .filter(|c| c.key == key)
            .map(|c| c.body.clone())
            .collect()
    }

    /// Get the total number of comments posted.
    pub async fn comment_count(&self) -> usize {
        self.comments.read().await.len()
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<TrackerError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Tracker for MockTracker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn find_items(&self, filter: &SearchFilter) -> Result<Vec<String>, TrackerError> {
        // Check for injected error
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.searches.write().await.push(filter.clone());
        Ok(self.keys.read().await.clone())
    }

    async fn fetch_fields(&self, key: &str) -> Result<Ticket, TrackerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.tickets
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| TrackerError::TicketNotFound(key.to_string()))
    }

    async fn post_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if self.failing_comments.read().await.contains(key) {
            return Err(TrackerError::ApiError(format!(
                "Comment rejected for {key}"
            )));
        }

        self.comments.write().await.push(RecordedComment {
            key: key.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
