//! Result submission.
//!
//! Submissions are fire-and-forget: the battery hands each result to a
//! [`ResultSink`] and moves on. Failures are logged and never retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use aimforge_common::config::ApiConfig;
use aimforge_common::error::{AimError, AimResult};
use aimforge_run_model::result::TestSubmission;

/// Path of the result endpoint, relative to the API base URL.
pub const RESULT_ENDPOINT: &str = "/api/test-result";

/// Receiver of finished run results.
pub trait ResultSink: Send + Sync {
    /// Hand over one submission. Must not block the caller.
    fn submit(&self, submission: TestSubmission);

    /// Sink name for logging.
    fn name(&self) -> &str;
}

/// Discards every submission.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn submit(&self, submission: TestSubmission) {
        tracing::debug!(test_type = %submission.test_type, "Submission disabled, result kept local");
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Posts submissions as JSON to the results API on a spawned task.
#[derive(Debug, Clone)]
pub struct HttpResultSink {
    client: Client,
    endpoint: String,
}

impl HttpResultSink {
    pub fn new(config: &ApiConfig) -> AimResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| AimError::submission(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint_url(&config.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ResultSink for HttpResultSink {
    fn submit(&self, submission: TestSubmission) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, result not submitted");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            let test_type = submission.test_type.clone();
            match post_submission(&client, &endpoint, &submission).await {
                Ok(()) => tracing::info!(%test_type, "Result submitted"),
                Err(e) => tracing::warn!(%test_type, error = %e, "Result submission failed"),
            }
        });
    }

    fn name(&self) -> &str {
        "http"
    }
}

async fn post_submission(
    client: &Client,
    endpoint: &str,
    submission: &TestSubmission,
) -> AimResult<()> {
    let response = client
        .post(endpoint)
        .json(submission)
        .send()
        .await
        .map_err(|e| AimError::submission(format!("Request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(AimError::submission(format!("Server responded with {status}")))
    }
}

/// Join the base URL and the result endpoint.
pub fn endpoint_url(base_url: &str) -> String {
    format!("{}{RESULT_ENDPOINT}", base_url.trim_end_matches('/'))
}

/// Choose a sink for the API configuration.
pub fn sink_for(config: &ApiConfig) -> AimResult<Arc<dyn ResultSink>> {
    if config.enabled {
        let sink = HttpResultSink::new(config)?;
        tracing::info!(endpoint = sink.endpoint(), "Submitting results over HTTP");
        Ok(Arc::new(sink))
    } else {
        Ok(Arc::new(NullSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        assert_eq!(
            endpoint_url("http://localhost:3000/"),
            "http://localhost:3000/api/test-result"
        );
        assert_eq!(
            endpoint_url("https://aim.example"),
            "https://aim.example/api/test-result"
        );
    }

    #[test]
    fn test_disabled_api_uses_null_sink() {
        let config = ApiConfig {
            enabled: false,
            ..ApiConfig::default()
        };
        assert_eq!(sink_for(&config).unwrap().name(), "null");
    }

    #[tokio::test]
    async fn test_unreachable_server_does_not_block() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            enabled: true,
            timeout_secs: 1,
        };
        let sink = sink_for(&config).unwrap();
        assert_eq!(sink.name(), "http");

        let submission = TestSubmission {
            user_id: "tester".to_string(),
            test_type: "flick".to_string(),
            dpi: 800.0,
            in_game_sensitivity: 1.0,
            inches_per_360: 12.6,
            accuracy_percentage: 50.0,
            reaction_time_ms: None,
            consistency_score: None,
            movement_smoothness: 0.0,
            correction_rate: 0.0,
            overshoot_rate: 0.0,
            undershoot_rate: 0.0,
            optimization_score: 10.0,
            game: "generic".to_string(),
            detail: aimforge_run_model::result::ScenarioDetail::Flick {
                attempts: 1,
                stray_clicks: 0,
            },
        };
        // Returns immediately; the failure is only logged.
        sink.submit(submission);
    }
}
