//! Qubole query engine implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::EngineConfig;

use super::{EngineError, JobHandle, JobStatus, QueryEngine};

/// Qubole query engine implementation.
pub struct QuboleEngine {
    client: Client,
    config: EngineConfig,
}

impl QuboleEngine {
    /// Create a new QuboleEngine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn build_submit_url(&self) -> String {
        format!("{}/api/v1.2/commands", self.base_url())
    }

    fn build_status_url(&self, id: &str) -> String {
        format!("{}/api/v1.2/commands/{}", self.base_url(), id)
    }

    fn build_results_url(&self, id: &str) -> String {
        format!(
            "{}/api/v1.2/commands/{}/results?inline=true",
            self.base_url(),
            id
        )
    }
}

#[async_trait]
impl QueryEngine for QuboleEngine {
    fn name(&self) -> &str {
        "qubole"
    }

    async fn submit(
        &self,
        query: &str,
        label: &str,
        name: &str,
    ) -> Result<JobHandle, EngineError> {
        let url = self.build_submit_url();
        debug!(label = label, name = name, "Submitting query job");

        let response = self
            .client
            .post(&url)
            .header("X-AUTH-TOKEN", &self.config.token)
            .json(&serde_json::json!({
                "query": query,
                "label": label,
                "name": name,
                "command_type": "HiveCommand",
            }))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let command: CommandResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(job_id = command.id, "Query job submitted");
        Ok(JobHandle::new(command.id.to_string()))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus, EngineError> {
        let url = self.build_status_url(&handle.id);

        let response = self
            .client
            .get(&url)
            .header("X-AUTH-TOKEN", &self.config.token)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(EngineError::JobNotFound(handle.id.clone()));
        }
        if !response.status().is_success() {
            return Err(EngineError::ApiError(format!("HTTP {}", response.status())));
        }

        let command: CommandResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(JobStatus::parse(&command.status))
    }

    async fn fetch_results(&self, handle: &JobHandle) -> Result<String, EngineError> {
        let url = self.build_results_url(&handle.id);
        debug!(job_id = %handle.id, "Fetching query results");

        let response = self
            .client
            .get(&url)
            .header("X-AUTH-TOKEN", &self.config.token)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(EngineError::JobNotFound(handle.id.clone()));
        }
        if !response.status().is_success() {
            return Err(EngineError::ApiError(format!("HTTP {}", response.status())));
        }

        let results: ResultsResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(results.results)
    }
}

fn map_request_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else if e.is_connect() {
        EngineError::ConnectionFailed(e.to_string())
    } else {
        EngineError::ApiError(e.to_string())
    }
}

// Qubole API response types
#[derive(Debug, Deserialize)]
struct CommandResponse {
    id: u64,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    results: String,
}
