//! Report window computation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Run day must be Friday, Saturday or Sunday, got {0}")]
    NotAReportDay(Weekday),
}

/// The date range one weekly report covers.
///
/// Computed once per run; every weekend day resolves to the same window so
/// the schedule can fire on Friday, Saturday or Sunday interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    /// Compute the window for a run executed on `today`.
    ///
    /// Friday, Saturday and Sunday map to day offsets 1, 2 and 3 from today
    /// to the window's end date; the start sits six days earlier, so the
    /// window always spans the previous Friday through Thursday. Any other
    /// weekday refuses to run.
    pub fn for_run_date(today: NaiveDate) -> Result<Self, WindowError> {
        let offset = match today.weekday() {
            Weekday::Fri => 1,
            Weekday::Sat => 2,
            Weekday::Sun => 3,
            other => return Err(WindowError::NotAReportDay(other)),
        };
        let end = today - Duration::days(offset);
        let start = end - Duration::days(6);
        Ok(Self { start, end })
    }

    /// Compact `YYYYMMDD` form used in query text and ticket comments.
    pub fn start_compact(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }

    /// Compact `YYYYMMDD` form used in query text and ticket comments.
    pub fn end_compact(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_friday_run_ends_previous_thursday() {
        // 2024-07-12 is a Friday
        let window = ReportWindow::for_run_date(date(2024, 7, 12)).unwrap();
        assert_eq!(window.end, date(2024, 7, 11));
        assert_eq!(window.start, date(2024, 7, 5));
    }

    #[test]
    fn test_saturday_run_matches_friday_window() {
        let window = ReportWindow::for_run_date(date(2024, 7, 13)).unwrap();
        assert_eq!(window.end, date(2024, 7, 11));
        assert_eq!(window.start, date(2024, 7, 5));
    }

    #[test]
    fn test_sunday_run_matches_friday_window() {
        let window = ReportWindow::for_run_date(date(2024, 7, 14)).unwrap();
        assert_eq!(window.end, date(2024, 7, 11));
        assert_eq!(window.start, date(2024, 7, 5));
    }

    #[test]
    fn test_window_spans_six_days() {
        let window = ReportWindow::for_run_date(date(2024, 7, 12)).unwrap();
        assert_eq!((window.end - window.start).num_days(), 6);
        assert!(window.start <= window.end);
    }

    #[test]
    fn test_weekdays_are_rejected() {
        for day in 15..=18 {
            // 2024-07-15 (Mon) through 2024-07-18 (Thu)
            let result = ReportWindow::for_run_date(date(2024, 7, day));
            assert!(matches!(result, Err(WindowError::NotAReportDay(_))));
        }
    }

    #[test]
    fn test_compact_rendering() {
        let window = ReportWindow::for_run_date(date(2024, 7, 12)).unwrap();
        assert_eq!(window.start_compact(), "20240705");
        assert_eq!(window.end_compact(), "20240711");
    }
}
