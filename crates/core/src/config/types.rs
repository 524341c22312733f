use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logs: LogConfig,
}

/// Ticket tracker (Jira) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Tracker base URL (e.g., "https://jira.example.com")
    pub url: String,
    /// Basic-auth username
    pub username: String,
    /// Basic-auth token or password
    pub token: String,
    /// Projects searched for reportable tickets
    #[serde(default = "default_projects")]
    pub projects: Vec<String>,
    /// Issue types eligible for reporting
    pub issue_types: Vec<String>,
    /// Ticket statuses eligible for reporting
    pub statuses: Vec<String>,
    /// Agencies whose tickets are reported on
    pub agencies: Vec<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Maximum tickets returned by a search (default: 100)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_projects() -> Vec<String> {
    vec!["CAM".to_string()]
}

fn default_timeout() -> u32 {
    30
}

fn default_max_results() -> u32 {
    100
}

/// Query engine (Qubole) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Engine API base URL
    #[serde(default = "default_engine_url")]
    pub url: String,
    /// API token
    pub token: String,
    /// Cluster label queries are submitted to
    pub cluster_label: String,
    /// Seconds between job status polls (default: 5)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Cap on a single attempt's total polling time in seconds (default: 3600)
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Fresh submissions tried before giving up on a unit (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_engine_url() -> String {
    "https://api.qubole.com".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_timeout() -> u64 {
    3600
}

fn default_max_attempts() -> u32 {
    3
}

/// Report behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Application name used for the run marker / log file
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Accuracy percentage below which an alert comment is posted (default: 45.0)
    #[serde(default = "default_accuracy_threshold")]
    pub accuracy_threshold_pct: f64,
    /// Worker pool size override; defaults to the host's available parallelism
    #[serde(default)]
    pub pool_size: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            accuracy_threshold_pct: default_accuracy_threshold(),
            pool_size: None,
        }
    }
}

fn default_app_name() -> String {
    "targeting_accuracy".to_string()
}

fn default_accuracy_threshold() -> f64 {
    45.0
}

/// Log file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Directory run logs are written to
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Days a run log is kept before the post-run purge removes it (default: 45)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_retention_days() -> u32 {
    45
}

/// Sanitized config for logging at startup (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub tracker: SanitizedTrackerConfig,
    pub engine: SanitizedEngineConfig,
    pub report: ReportConfig,
    pub logs: LogConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrackerConfig {
    pub url: String,
    pub username: String,
    pub token_configured: bool,
    pub projects: Vec<String>,
    pub issue_types: Vec<String>,
    pub statuses: Vec<String>,
    pub agencies: Vec<String>,
    pub timeout_secs: u32,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEngineConfig {
    pub url: String,
    pub token_configured: bool,
    pub cluster_label: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    pub max_attempts: u32,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            tracker: SanitizedTrackerConfig {
                url: config.tracker.url.clone(),
                username: config.tracker.username.clone(),
                token_configured: !config.tracker.token.is_empty(),
                projects: config.tracker.projects.clone(),
                issue_types: config.tracker.issue_types.clone(),
                statuses: config.tracker.statuses.clone(),
                agencies: config.tracker.agencies.clone(),
                timeout_secs: config.tracker.timeout_secs,
                max_results: config.tracker.max_results,
            },
            engine: SanitizedEngineConfig {
                url: config.engine.url.clone(),
                token_configured: !config.engine.token.is_empty(),
                cluster_label: config.engine.cluster_label.clone(),
                poll_interval_secs: config.engine.poll_interval_secs,
                poll_timeout_secs: config.engine.poll_timeout_secs,
                max_attempts: config.engine.max_attempts,
                timeout_secs: config.engine.timeout_secs,
            },
            report: config.report.clone(),
            logs: config.logs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
[tracker]
url = "https://jira.example.com"
username = "svc-report"
token = "secret"
issue_types = ["Campaign"]
statuses = ["Fulfilled"]
agencies = ["Acme"]

[engine]
token = "qb-secret"
cluster_label = "hive-prod"
"#
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.tracker.url, "https://jira.example.com");
        assert_eq!(config.tracker.projects, vec!["CAM".to_string()]);
        assert_eq!(config.tracker.timeout_secs, 30);
        assert_eq!(config.tracker.max_results, 100);
        assert_eq!(config.engine.url, "https://api.qubole.com");
        assert_eq!(config.engine.poll_interval_secs, 5);
        assert_eq!(config.engine.max_attempts, 3);
        assert_eq!(config.report.app_name, "targeting_accuracy");
        assert_eq!(config.report.accuracy_threshold_pct, 45.0);
        assert!(config.report.pool_size.is_none());
        assert_eq!(config.logs.dir.to_str().unwrap(), "logs");
        assert_eq!(config.logs.retention_days, 45);
    }

    #[test]
    fn test_deserialize_missing_tracker_fails() {
        let toml = r#"
[engine]
token = "qb-secret"
cluster_label = "hive-prod"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_missing_cluster_label_fails() {
        let toml = r#"
[tracker]
url = "https://jira.example.com"
username = "svc-report"
token = "secret"
issue_types = ["Campaign"]
statuses = ["Fulfilled"]
agencies = ["Acme"]

[engine]
token = "qb-secret"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_with_overrides() {
        let toml = r#"
[tracker]
url = "https://jira.example.com"
username = "svc-report"
token = "secret"
projects = ["CAM", "ONR"]
issue_types = ["Campaign"]
statuses = ["Fulfilled"]
agencies = ["Acme"]
timeout_secs = 10

[engine]
url = "https://qubole.internal"
token = "qb-secret"
cluster_label = "hive-dev"
poll_interval_secs = 1
max_attempts = 5

[report]
app_name = "ta_report"
accuracy_threshold_pct = 50.0
pool_size = 4

[logs]
dir = "/var/log/scorecard"
retention_days = 7
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.tracker.projects.len(), 2);
        assert_eq!(config.tracker.timeout_secs, 10);
        assert_eq!(config.engine.url, "https://qubole.internal");
        assert_eq!(config.engine.poll_interval_secs, 1);
        assert_eq!(config.engine.max_attempts, 5);
        assert_eq!(config.report.app_name, "ta_report");
        assert_eq!(config.report.accuracy_threshold_pct, 50.0);
        assert_eq!(config.report.pool_size, Some(4));
        assert_eq!(config.logs.dir.to_str().unwrap(), "/var/log/scorecard");
        assert_eq!(config.logs.retention_days, 7);
    }

    #[test]
    fn test_sanitized_config_redacts_tokens() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.tracker.token_configured);
        assert!(sanitized.engine.token_configured);

        let rendered = serde_json::to_string(&sanitized).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("jira.example.com"));
    }
}
