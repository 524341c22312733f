use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("SCORECARD_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
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
cluster_label = "hive-prod"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.tracker.username, "svc-report");
        assert_eq!(config.engine.cluster_label, "hive-prod");
    }

    #[test]
    fn test_load_config_from_str_missing_engine() {
        let toml = r#"
[tracker]
url = "https://jira.example.com"
username = "svc-report"
token = "secret"
issue_types = ["Campaign"]
statuses = ["Fulfilled"]
agencies = ["Acme"]
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
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
poll_interval_secs = 2

[report]
accuracy_threshold_pct = 40.0
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.engine.poll_interval_secs, 2);
        assert_eq!(config.report.accuracy_threshold_pct, 40.0);
    }
}
