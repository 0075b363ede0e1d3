use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogHubError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Missing required column '{column}' in table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' in table '{table}' is not part of the table contract")]
    UnexpectedColumn { table: String, column: String },

    #[error("Data type conversion failed for column '{column}' in table '{table}' (row {row}): {reason}")]
    ColumnConversion {
        table: String,
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Missing input table '{input}' for operation '{operation}'")]
    MissingInput { operation: String, input: String },

    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    #[error("Error in {application} API: {status} - {body}")]
    Api {
        application: String,
        status: u16,
        body: String,
    },

    #[error("Max retries exceeded for {application} after {attempts} attempts")]
    MaxRetriesExceeded { application: String, attempts: u32 },

    #[error("Response of {application} API has no '{key}' field")]
    MissingResponseKey { application: String, key: String },

    #[error("Calculation of {application} still running after {elapsed_secs} seconds")]
    CalculationTimeout { application: String, elapsed_secs: u64 },
}

impl LogHubError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// True for failures reported by the remote service rather than by local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RequestError(_)
                | Self::Api { .. }
                | Self::MaxRetriesExceeded { .. }
                | Self::MissingResponseKey { .. }
                | Self::CalculationTimeout { .. }
        )
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfig { .. }
            | Self::ValidationError { .. }
            | Self::MissingColumn { .. }
            | Self::UnexpectedColumn { .. }
            | Self::ColumnConversion { .. }
            | Self::MissingInput { .. }
            | Self::UnknownOperation { .. }
            | Self::UrlError(_) => 2,
            e if e.is_remote() => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogHubError>;
