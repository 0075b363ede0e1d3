pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::LocalStorage;
pub use app::RunOptions;
pub use config::ClientConfig;
pub use core::{CsvPipeline, DatasetClient, LogHubClient, Operation, RunEngine};
pub use domain::model::{OperationOutput, OperationRequest, SaveScenario, Table, WorkspaceLinks};
pub use utils::error::{LogHubError, Result};
