#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::dataset::DEFAULT_DATASET_API;
use crate::domain::model::{PollingPolicy, RetryPolicy};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, validate_url, Validate};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::{JobConfig, TomlConfig};

pub const DEFAULT_API_SERVER: &str =
    "https://supply-chain-app-eu-supply-chain-eu-development.azurewebsites.net";

pub const API_SERVER_ENV: &str = "LOG_HUB_API_SERVER";
pub const API_KEY_ENV: &str = "LOG_HUB_API_KEY";
pub const EMAIL_ENV: &str = "LOG_HUB_EMAIL";

/// Connection settings shared by every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_server: String,
    pub api_key: String,
    pub retry: RetryPolicy,
    pub polling: PollingPolicy,
    pub request_timeout: Option<Duration>,
    pub dataset_api: String,
    pub email: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_server: DEFAULT_API_SERVER.to_string(),
            api_key: String::new(),
            retry: RetryPolicy::default(),
            polling: PollingPolicy::default(),
            request_timeout: None,
            dataset_api: DEFAULT_DATASET_API.to_string(),
            email: None,
        }
    }
}

impl ClientConfig {
    /// Reads `LOG_HUB_API_SERVER`, `LOG_HUB_API_KEY` and `LOG_HUB_EMAIL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        Self {
            api_server: lookup(API_SERVER_ENV)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.api_server),
            api_key: lookup(API_KEY_ENV).unwrap_or_default(),
            email: lookup(EMAIL_ENV).filter(|s| !s.trim().is_empty()),
            ..defaults
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_api_server(mut self, api_server: impl Into<String>) -> Self {
        self.api_server = api_server.into();
        self
    }
}

impl ConfigProvider for ClientConfig {
    fn api_server(&self) -> &str {
        &self.api_server
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn polling_policy(&self) -> PollingPolicy {
        self.polling
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validate_url("client.api_server", &self.api_server)?;
        validate_non_empty_string("client.api_key", &self.api_key)?;
        validate_url("dataset.api_server", &self.dataset_api)?;
        validate_positive_number("retry.max_attempts", u64::from(self.retry.max_attempts), 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_uses_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.api_server, DEFAULT_API_SERVER);
        assert_eq!(config.api_key, "");
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            (API_SERVER_ENV, "https://staging.example.com"),
            (API_KEY_ENV, "secret"),
            (EMAIL_ENV, "planner@example.com"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_server, "https://staging.example.com");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.email.as_deref(), Some("planner@example.com"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = ClientConfig::default().with_api_key("key");
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
