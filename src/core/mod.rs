pub mod client;
pub mod dataset;
pub mod engine;
pub mod operation;
pub mod pipeline;
pub mod scenario;
pub mod schema;

pub use crate::domain::model::{OperationOutput, OperationRequest, Record, SaveScenario, Table};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use client::LogHubClient;
pub use dataset::DatasetClient;
pub use engine::RunEngine;
pub use operation::{InputTable, Operation};
pub use pipeline::CsvPipeline;
pub use schema::TableSchema;
