//! Ticket comment bodies.
//!
//! Comments use the tracker's wiki table/mention markup. Field labels and
//! alert wording are load-bearing: downstream teams scrape them.

use crate::engine::QueryResult;
use crate::window::ReportWindow;

const TICKET_DATA_ALERT: &str = "There may be a problem with the ticket data, please check that \
     both the 'Pixels' and 'Profile ID/s' fields have been populated and are proportionate.";

const ACCURACY_ALERT: &str = "The Targeting Accuracy has fallen below -";

/// Report table posted on a ticket after a successful query.
pub fn report_comment(pixel: &str, result: &QueryResult, window: &ReportWindow) -> String {
    format!(
        "|Reporting Dates|{start}  thru  {end}|\n\
         |Pixel|{pixel}|\n\
         |x.TOTAL_IMPRESSIONS|{impressions}|\n\
         |y.ELIGIBLE_INDIVIDUALS|{eligible}|\n\
         |IND_MATCH_PERCENT|{match_pct:.2}%|\n\
         |z.MATCHED_INDIVIDUALS|{matched}|\n\
         |Targeting Accuracy|{accuracy:.2}%|",
        start = window.start_compact(),
        end = window.end_compact(),
        pixel = pixel,
        impressions = format_thousands(result.total_impressions),
        eligible = format_thousands(result.eligible_individuals),
        match_pct = result.ind_match_percent,
        matched = format_thousands(result.matched_individuals),
        accuracy = result.targeting_accuracy,
    )
}

/// Alert posted when a ticket's data cannot produce a report.
pub fn data_alert_comment(manager: &str) -> String {
    format!("[~{}]\n{}", mention(manager), TICKET_DATA_ALERT)
}

/// Alert posted when a unit's accuracy falls below the configured threshold.
pub fn accuracy_alert_comment(manager: &str, pixel: &str, threshold_pct: f64) -> String {
    format!(
        "[~{}]\nPixel: {},\n{} {}%",
        mention(manager),
        pixel,
        ACCURACY_ALERT,
        threshold_pct
    )
}

/// Tracker mention handle: display name lowercased and dot-joined.
fn mention(manager: &str) -> String {
    manager
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
}

/// Group digits in threes: 1234567 -> "1,234,567".
fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
