use crate::config::ClientConfig;
use crate::domain::model::SaveScenario;
use crate::utils::error::{LogHubError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub client: ClientSection,
    pub retry: Option<RetrySection>,
    pub polling: Option<PollingSection>,
    pub dataset: Option<DatasetSection>,
    pub job: Option<JobConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSection {
    pub api_server: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSection {
    pub interval_seconds: Option<u64>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSection {
    pub api_server: Option<String>,
    pub email: Option<String>,
}

/// One operation run described in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub operation: String,
    /// Input table name to CSV file.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    pub parameters: Option<Value>,
    pub save_scenario: Option<SaveScenario>,
    #[serde(default)]
    pub fetch_links: bool,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default)]
    pub zip: bool,
}

fn default_output_path() -> String {
    "./output".to_string()
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| LogHubError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| LogHubError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Environment settings overlaid with the values from the file.
    pub fn client_config(&self) -> ClientConfig {
        self.overlay(ClientConfig::from_env())
    }

    fn overlay(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(api_server) = &self.client.api_server {
            config.api_server = api_server.clone();
        }
        if let Some(api_key) = &self.client.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(seconds) = self.client.request_timeout_seconds {
            config.request_timeout = Some(Duration::from_secs(seconds));
        }
        if let Some(retry) = &self.retry {
            if let Some(max_attempts) = retry.max_attempts {
                config.retry.max_attempts = max_attempts;
            }
            if let Some(seconds) = retry.delay_seconds {
                config.retry.delay = Duration::from_secs(seconds);
            }
        }
        if let Some(polling) = &self.polling {
            if let Some(seconds) = polling.interval_seconds {
                config.polling.interval = Duration::from_secs(seconds);
            }
            if let Some(seconds) = polling.timeout_seconds {
                config.polling.timeout = Duration::from_secs(seconds);
            }
        }
        if let Some(dataset) = &self.dataset {
            if let Some(api_server) = &dataset.api_server {
                config.dataset_api = api_server.clone();
            }
            if let Some(email) = &dataset.email {
                config.email = Some(email.clone());
            }
        }
        config
    }

    pub fn job(&self) -> Option<&JobConfig> {
        self.job.as_ref()
    }

    pub fn validate_config(&self) -> Result<()> {
        self.client_config().validate()?;

        if let Some(retry) = &self.retry {
            if let Some(delay) = retry.delay_seconds {
                validate_range("retry.delay_seconds", delay, 0, 600)?;
            }
        }

        if let Some(polling) = &self.polling {
            if let Some(timeout) = polling.timeout_seconds {
                validate_positive_number("polling.timeout_seconds", timeout, 1)?;
            }
        }

        if let Some(job) = &self.job {
            job.validate()?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("job.operation", &self.operation)?;
        validate_path("job.output_path", &self.output_path)?;
        validate_file_extensions("job.inputs", self.inputs.values().map(String::as_str), &["csv"])?;
        if let Some(parameters) = &self.parameters {
            if !parameters.is_object() {
                return Err(LogHubError::InvalidConfigValue {
                    field: "job.parameters".to_string(),
                    value: parameters.to_string(),
                    reason: "parameters must be a table".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RetryPolicy;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_job_config() {
        let toml_content = r#"
[client]
api_server = "https://api.example.com"
api_key = "secret"

[retry]
max_attempts = 5
delay_seconds = 2

[job]
operation = "forward_center_of_gravity"
output_path = "./results"
zip = true

[job.inputs]
addresses = "data/addresses.csv"

[job.parameters]
numberOfCenters = 3
distanceUnit = "km"

[job.save_scenario]
saveScenario = true
workspaceId = "ws-42"
scenarioName = "Q3"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let client = config.overlay(ClientConfig::default());
        assert_eq!(client.api_server, "https://api.example.com");
        assert_eq!(client.retry.max_attempts, 5);
        assert_eq!(client.retry.delay, Duration::from_secs(2));

        let job = config.job().unwrap();
        assert_eq!(job.operation, "forward_center_of_gravity");
        assert_eq!(job.inputs["addresses"], "data/addresses.csv");
        assert_eq!(
            job.parameters,
            Some(json!({"numberOfCenters": 3, "distanceUnit": "km"}))
        );
        assert!(job.save_scenario.as_ref().unwrap().is_saved());
        assert!(job.zip);
        assert!(!job.fetch_links);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LOGHUB_TEST_TOML_KEY", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[client]
api_key = "${LOGHUB_TEST_TOML_KEY}"
api_server = "${LOGHUB_TEST_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert_eq!(config.client.api_key.as_deref(), Some("from-env"));
        assert_eq!(
            config.client.api_server.as_deref(),
            Some("${LOGHUB_TEST_UNSET_VARIABLE}")
        );

        std::env::remove_var("LOGHUB_TEST_TOML_KEY");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[client]
api_server = "invalid-url"
api_key = "secret"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[client]
api_server = "https://api.example.com"
api_key = "secret"

[job]
operation = "forward_geocoding"
inputs = { addresses = "addresses.xlsx" }
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(LogHubError::InvalidConfigValue { ref field, .. }) if field == "job.inputs"
        ));
    }

    #[test]
    fn test_missing_sections_keep_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        let client = config.overlay(ClientConfig::default());
        assert_eq!(client.retry, RetryPolicy::default());
        assert!(config.job().is_none());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[client]
api_server = "https://api.example.com"
api_key = "secret"

[polling]
interval_seconds = 5
timeout_seconds = 60
"#,
            )
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        let client = config.overlay(ClientConfig::default());
        assert_eq!(client.polling.interval, Duration::from_secs(5));
        assert_eq!(client.polling.timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[client\napi_key =").unwrap_err();
        assert!(matches!(err, LogHubError::ConfigError { .. }));
    }
}
