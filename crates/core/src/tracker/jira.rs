//! Jira tracker backend implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::ticket::Ticket;

use super::{SearchFilter, Tracker, TrackerError};

// Custom field ids on the campaign ticket screen.
const FIELD_START_DATE: &str = "customfield_10431";
const FIELD_END_DATE: &str = "customfield_10418";
const FIELD_PIXELS: &str = "customfield_11447";
const FIELD_PROFILE_IDS: &str = "customfield_12413";
const FIELD_MANAGER: &str = "customfield_11486";

/// Label every reportable campaign ticket carries.
const REPORTING_LABEL: &str = "Individually_Fulfilled";

/// Jira tracker backend implementation.
pub struct JiraTracker {
    client: Client,
    config: TrackerConfig,
}

impl JiraTracker {
    /// Create a new JiraTracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Build the search URL for a ticket discovery query.
    fn build_search_url(&self, filter: &SearchFilter) -> String {
        format!(
            "{}/rest/api/2/search?jql={}&fields=key&maxResults={}",
            self.base_url(),
            urlencoding::encode(&build_jql(filter)),
            self.config.max_results
        )
    }

    /// Build the issue URL selecting only the report-relevant custom fields.
    fn build_issue_url(&self, key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}?fields={},{},{},{},{}",
            self.base_url(),
            urlencoding::encode(key),
            FIELD_START_DATE,
            FIELD_END_DATE,
            FIELD_PIXELS,
            FIELD_PROFILE_IDS,
            FIELD_MANAGER,
        )
    }

    fn build_comment_url(&self, key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}/comment",
            self.base_url(),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl Tracker for JiraTracker {
    fn name(&self) -> &str {
        "jira"
    }

    async fn find_items(&self, filter: &SearchFilter) -> Result<Vec<String>, TrackerError> {
        let url = self.build_search_url(filter);
        debug!(url = %url, "Searching tracker");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.token))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::ApiError(format!("Failed to parse response: {}", e)))?;

        let keys: Vec<String> = search.issues.into_iter().map(|i| i.key).collect();
        debug!(matches = keys.len(), "Tracker search complete");
        Ok(keys)
    }

    async fn fetch_fields(&self, key: &str) -> Result<Ticket, TrackerError> {
        let url = self.build_issue_url(key);
        debug!(key = key, "Fetching ticket fields");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.token))
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TrackerError::TicketNotFound(key.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let issue: IssueResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::ApiError(format!("Failed to parse response: {}", e)))?;

        let start_date = parse_date_field(
            key,
            FIELD_START_DATE,
            issue.fields.customfield_10431.as_deref(),
        )?;
        let end_date = parse_date_field(
            key,
            FIELD_END_DATE,
            issue.fields.customfield_10418.as_deref(),
        )?;
        // Empty pixel/profile fields become empty lists here; the splitter
        // turns those into a data alert rather than a hard failure.
        let pixels = split_id_list(issue.fields.customfield_11447.as_deref().unwrap_or(""), ',');
        let profile_ids =
            split_id_list(issue.fields.customfield_12413.as_deref().unwrap_or(""), '|');
        let manager = issue.fields.customfield_11486.unwrap_or_default();

        Ok(Ticket::new(
            key,
            start_date,
            end_date,
            pixels,
            profile_ids,
            manager,
        ))
    }

    async fn post_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        let url = self.build_comment_url(key);
        debug!(key = key, "Posting ticket comment");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.token))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TrackerError::TicketNotFound(key.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TrackerError::ApiError(format!(
                "HTTP {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        Ok(())
    }
}

fn map_request_error(e: reqwest::Error) -> TrackerError {
    if e.is_timeout() {
        TrackerError::Timeout
    } else if e.is_connect() {
        TrackerError::ConnectionFailed(e.to_string())
    } else {
        TrackerError::ApiError(e.to_string())
    }
}

/// Build the JQL discovery query from the configured filters.
fn build_jql(filter: &SearchFilter) -> String {
    format!(
        "project IN ({}) AND issuetype IN ({}) AND status IN ({}) AND agency IN ({}) \
         AND labels IN ('{}') ORDER BY 'End Date' ASC",
        quote_list(&filter.projects),
        quote_list(&filter.issue_types),
        quote_list(&filter.statuses),
        quote_list(&filter.agencies),
        REPORTING_LABEL,
    )
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split a delimited identifier field, dropping whitespace and empty entries.
fn split_id_list(raw: &str, separator: char) -> Vec<String> {
    raw.replace(' ', "")
        .split(separator)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `YYYY-MM-DD` custom field into a typed date.
fn parse_date_field(
    key: &str,
    field: &str,
    value: Option<&str>,
) -> Result<NaiveDate, TrackerError> {
    let raw = value.ok_or_else(|| TrackerError::MalformedField {
        key: key.to_string(),
        field: field.to_string(),
        reason: "field is not set".to_string(),
    })?;

    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| TrackerError::MalformedField {
        key: key.to_string(),
        field: field.to_string(),
        reason: e.to_string(),
    })
}

// Jira API response types
#[derive(Debug, Deserialize)]
struct SearchResponse {
    issues: Vec<IssueRef>,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    customfield_10431: Option<String>,
    customfield_10418: Option<String>,
    customfield_11447: Option<String>,
    customfield_12413: Option<String>,
    customfield_11486: Option<String>,
}
