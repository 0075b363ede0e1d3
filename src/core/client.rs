use crate::core::scenario::map_link;
use crate::domain::model::{LongRunHandle, PollingPolicy, RetryPolicy, WorkspaceEntity, WorkspaceLinks};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LogHubError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};

const ENTITIES_LABEL: &str = "Entities With Tables";

/// HTTP transport for the Log-hub applications.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct LogHubClient {
    http: Client,
    api_server: String,
    api_key: String,
    retry: RetryPolicy,
    polling: PollingPolicy,
}

impl LogHubClient {
    pub fn new(api_server: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_server, api_key)
    }

    pub fn with_client(
        http: Client,
        api_server: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let api_server: String = api_server.into();
        Self {
            http,
            api_server: api_server.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
            polling: PollingPolicy::default(),
        }
    }

    pub fn from_provider<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config.api_server(), config.api_key())
            .with_retry_policy(config.retry_policy())
            .with_polling_policy(config.polling_policy()))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_polling_policy(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn application_url(&self, application: &str) -> String {
        format!("{}/api/applications/v1/{}", self.api_server, application)
    }

    fn authorization(&self) -> String {
        format!("apikey {}", self.api_key)
    }

    /// POSTs a payload to an application, retrying on throttling and transport errors.
    pub async fn post_application(
        &self,
        application: &str,
        label: &str,
        payload: &Value,
    ) -> Result<Value> {
        let url = self.application_url(application);
        tracing::debug!("POST {}", url);

        self.send_with_retry(application, label, || {
            self.http
                .post(&url)
                .header(ACCEPT, "application/json")
                .header(AUTHORIZATION, self.authorization())
                .header(CONTENT_TYPE, "application/json")
                .json(payload)
        })
        .await
    }

    /// Polls a long-running calculation until it finishes or the polling timeout passes.
    pub async fn poll_long_run(&self, handle: &LongRunHandle, label: &str) -> Result<Value> {
        let url = format!(
            "{}/{}",
            handle.api_server.trim_end_matches('/'),
            handle.url.trim_start_matches('/')
        );
        let started = Instant::now();

        loop {
            tracing::debug!("GET {}", url);
            let response = self
                .http
                .get(&url)
                .header(AUTHORIZATION, self.authorization())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(api_error(label, label, response).await);
            }

            let data: Value = response.json().await?;
            let running = data
                .get("calculationRunning")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !running {
                return Ok(data);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.polling.timeout {
                tracing::error!(
                    "Timeout of {} seconds is reached with the calculation still running. Try running the calculation again.",
                    self.polling.timeout.as_secs()
                );
                return Err(LogHubError::CalculationTimeout {
                    application: label.to_string(),
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            tracing::info!(
                "Calculation is still running with the progress {}%.",
                progress(&data)
            );
            tokio::time::sleep(self.polling.interval).await;
        }
    }

    /// Links to the entities saved in a workspace.
    pub async fn workspace_entities(&self, workspace_id: &str) -> Result<WorkspaceLinks> {
        self.workspace_links(workspace_id, None).await
    }

    /// Like [`workspace_entities`](Self::workspace_entities), resolving the map link
    /// by scenario name when the platform answers with an entity list.
    pub async fn workspace_links(
        &self,
        workspace_id: &str,
        scenario_name: Option<&str>,
    ) -> Result<WorkspaceLinks> {
        let url = format!(
            "{}/api/v1/workspace/{}/entitiesWithTables",
            self.api_server, workspace_id
        );
        tracing::debug!("GET {}", url);

        let data = self
            .send_with_retry(ENTITIES_LABEL, ENTITIES_LABEL, || {
                self.http
                    .get(&url)
                    .header(AUTHORIZATION, self.authorization())
            })
            .await?;

        match data {
            Value::Array(_) => {
                let entities: Vec<WorkspaceEntity> = serde_json::from_value(data)?;
                let map = scenario_name
                    .and_then(|name| map_link(&entities, name, &self.api_server));
                Ok(WorkspaceLinks {
                    map,
                    ..Default::default()
                })
            }
            other => Ok(serde_json::from_value(other)?),
        }
    }

    async fn send_with_retry<F>(&self, application: &str, label: &str, build: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let last_attempt = attempt == max_attempts;

            match build().send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json().await?);
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = retry_after(&response).unwrap_or(self.retry.delay);
                    if last_attempt {
                        tracing::info!("Rate limit exceeded.");
                    } else {
                        tracing::info!(
                            "Rate limit exceeded. Retrying in {} seconds.",
                            wait.as_secs()
                        );
                        tokio::time::sleep(wait).await;
                    }
                }
                Ok(response) => return Err(api_error(application, label, response).await),
                Err(e) => {
                    tracing::error!("Request failed: {}", e);
                    if !last_attempt {
                        tracing::info!("Retrying in {} seconds.", self.retry.delay.as_secs());
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        tracing::error!("Max retries exceeded.");
        Err(LogHubError::MaxRetriesExceeded {
            application: application.to_string(),
            attempts: max_attempts,
        })
    }
}

async fn api_error(application: &str, label: &str, response: Response) -> LogHubError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Error in {} API: {} - {}", label, status, body);
    LogHubError::Api {
        application: application.to_string(),
        status,
        body,
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn progress(data: &Value) -> String {
    match data.get("progress") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_application_url_normalizes_trailing_slash() {
        let client = LogHubClient::new("https://api.example.com/", "key");
        assert_eq!(
            client.application_url("geocoding"),
            "https://api.example.com/api/applications/v1/geocoding"
        );
    }

    #[test]
    fn test_default_policies() {
        let client = LogHubClient::new("https://api.example.com", "key");
        assert_eq!(client.retry_policy().max_attempts, 3);
        assert_eq!(client.retry_policy().delay, Duration::from_secs(15));
        assert_eq!(client.polling.timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_progress_formatting() {
        assert_eq!(progress(&json!({"progress": 42})), "42");
        assert_eq!(progress(&json!({"progress": "12.5"})), "12.5");
        assert_eq!(progress(&json!({})), "unknown");
    }
}
