//! Run markers and log retention.
//!
//! One report is allowed per report week. The marker is the run's own log
//! file, named for the week's Friday; if it already exists the week has been
//! reported and the process leaves without doing anything.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use tracing::{info, warn};

/// The Friday identifying the report week `today` falls in.
///
/// Friday, Saturday and Sunday resolve to the current week's Friday; Monday
/// through Thursday reach back to the previous week's.
pub fn marker_date(today: NaiveDate) -> NaiveDate {
    // Monday is 0, Friday is 4.
    let weekday = i64::from(today.weekday().num_days_from_monday());
    let friday = 4;
    if weekday >= friday {
        today - ChronoDuration::days(weekday - friday)
    } else {
        today - ChronoDuration::days(7 - (friday - weekday))
    }
}

/// Path of the marker/log file for the week `today` falls in.
pub fn marker_path(dir: &Path, app_name: &str, today: NaiveDate) -> PathBuf {
    dir.join(format!(
        "{}_{}.log",
        app_name,
        marker_date(today).format("%Y%m%d")
    ))
}

/// Delete run logs older than `retention_days`.
///
/// Only files with the `.log` suffix are considered; anything else that
/// found its way into the log directory is left alone. Individual files
/// that cannot be removed are logged and skipped.
pub fn purge_stale_logs(dir: &Path, retention_days: u32) -> Result<()> {
    let now = SystemTime::now();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read the log directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Could not stat {}: {}", path.display(), e);
                continue;
            }
        };
        if is_stale(modified, now, retention_days) {
            match std::fs::remove_file(&path) {
                Ok(()) => info!("Removed the stale run log {}", path.display()),
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    }
    Ok(())
}

fn is_stale(modified: SystemTime, now: SystemTime, retention_days: u32) -> bool {
    let cutoff = Duration::from_secs(u64::from(retention_days) * 86_400);
    now.duration_since(modified)
        .map(|age| age > cutoff)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_marker_date_through_the_week() {
        // 2024-07-12 is a Friday.
        let week_friday = date(2024, 7, 12);
        assert_eq!(marker_date(date(2024, 7, 12)), week_friday);
        assert_eq!(marker_date(date(2024, 7, 13)), week_friday);
        assert_eq!(marker_date(date(2024, 7, 14)), week_friday);
        assert_eq!(marker_date(date(2024, 7, 15)), week_friday);
        assert_eq!(marker_date(date(2024, 7, 18)), week_friday);
        // The next Friday starts a new week.
        assert_eq!(marker_date(date(2024, 7, 19)), date(2024, 7, 19));
    }

    #[test]
    fn test_marker_path_format() {
        let path = marker_path(Path::new("logs"), "targeting_accuracy", date(2024, 7, 14));
        assert_eq!(
            path,
            PathBuf::from("logs/targeting_accuracy_20240712.log")
        );
    }

    #[test]
    fn test_staleness_threshold() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        let day = 86_400;

        assert!(is_stale(modified, modified + Duration::from_secs(46 * day), 45));
        assert!(!is_stale(modified, modified + Duration::from_secs(44 * day), 45));
        // A file dated in the future is never stale.
        assert!(!is_stale(modified + Duration::from_secs(day), modified, 45));
    }

    #[test]
    fn test_recent_logs_survive_purge() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("targeting_accuracy_20240712.log");
        let other = dir.path().join("notes.txt");
        fs::write(&log, "run log").unwrap();
        fs::write(&other, "keep me").unwrap();

        purge_stale_logs(dir.path(), 45).unwrap();

        assert!(log.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_purge_requires_the_directory() {
        let result = purge_stale_logs(Path::new("/nonexistent/scorecard-logs"), 45);
        assert!(result.is_err());
    }
}
