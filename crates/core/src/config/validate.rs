use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Tracker URL, credentials and search filters are populated
/// - Engine token and cluster label are populated
/// - Polling, retry, threshold and retention values are in range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Tracker validation
    if config.tracker.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.url cannot be empty".to_string(),
        ));
    }
    if !config.tracker.url.starts_with("http") {
        return Err(ConfigError::ValidationError(format!(
            "tracker.url must be an http(s) URL, got '{}'",
            config.tracker.url
        )));
    }
    if config.tracker.token.is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.token cannot be empty".to_string(),
        ));
    }
    if config.tracker.projects.is_empty()
        || config.tracker.issue_types.is_empty()
        || config.tracker.statuses.is_empty()
        || config.tracker.agencies.is_empty()
    {
        return Err(ConfigError::ValidationError(
            "tracker search filters (projects, issue_types, statuses, agencies) cannot be empty"
                .to_string(),
        ));
    }

    // Engine validation
    if config.engine.token.is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.token cannot be empty".to_string(),
        ));
    }
    if config.engine.cluster_label.is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.cluster_label cannot be empty".to_string(),
        ));
    }
    if config.engine.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.poll_interval_secs cannot be 0".to_string(),
        ));
    }
    if config.engine.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "engine.max_attempts cannot be 0".to_string(),
        ));
    }

    // Report validation
    if !(0.0..=100.0).contains(&config.report.accuracy_threshold_pct) {
        return Err(ConfigError::ValidationError(format!(
            "report.accuracy_threshold_pct must be between 0 and 100, got {}",
            config.report.accuracy_threshold_pct
        )));
    }
    if config.report.pool_size == Some(0) {
        return Err(ConfigError::ValidationError(
            "report.pool_size cannot be 0".to_string(),
        ));
    }

    // Log validation
    if config.logs.retention_days == 0 {
        return Err(ConfigError::ValidationError(
            "logs.retention_days cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
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
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        let config = valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bad_url_fails() {
        let mut config = valid_config();
        config.tracker.url = "jira.example.com".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_filters_fail() {
        let mut config = valid_config();
        config.tracker.agencies.clear();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_threshold_out_of_range_fails() {
        let mut config = valid_config();
        config.report.accuracy_threshold_pct = 120.0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = valid_config();
        config.engine.poll_interval_secs = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_pool_size_fails() {
        let mut config = valid_config();
        config.report.pool_size = Some(0);
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_retention_fails() {
        let mut config = valid_config();
        config.logs.retention_days = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
