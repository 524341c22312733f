//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external service traits,
//! allowing full report runs to be tested without a tracker or a cluster.
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecard_core::testing::{fixtures, JobScript, MockQueryEngine, MockTracker};
//!
//! let tracker = MockTracker::new();
//! let engine = MockQueryEngine::new();
//!
//! // Configure mock responses
//! tracker.add_ticket(fixtures::live_ticket("CAM-1", &["100"], &["10"])).await;
//! engine.push_script("CAM-1, 100", JobScript::failed()).await;
//!
//! // Use in a ReportOrchestrator...
//! ```

pub mod mock_engine;
pub mod mock_tracker;

pub use mock_engine::{JobScript, MockQueryEngine};
pub use mock_tracker::MockTracker;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::ticket::{ReportingUnit, Ticket};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Create a campaign ticket live through July 2024, covering the window
    /// of a run made on Friday 2024-07-12.
    pub fn live_ticket(key: &str, pixels: &[&str], profile_ids: &[&str]) -> Ticket {
        Ticket::new(
            key,
            date(2024, 7, 1),
            date(2024, 7, 31),
            pixels.iter().map(|p| p.to_string()).collect(),
            profile_ids.iter().map(|p| p.to_string()).collect(),
            "Jane Doe",
        )
    }

    /// Create a ticket whose campaign ended in June 2024, outside any July
    /// report window.
    pub fn expired_ticket(key: &str) -> Ticket {
        Ticket::new(
            key,
            date(2024, 6, 1),
            date(2024, 6, 30),
            vec!["100".to_string()],
            vec!["10".to_string()],
            "Jane Doe",
        )
    }

    /// Create a single reporting unit with the July 2024 campaign dates.
    pub fn unit(key: &str, pixel: &str, profile_id: &str) -> ReportingUnit {
        ReportingUnit {
            key: key.to_string(),
            pixel: pixel.to_string(),
            profile_id: profile_id.to_string(),
            start_date: date(2024, 7, 1),
            end_date: date(2024, 7, 31),
            manager: "Jane Doe".to_string(),
        }
    }
}
