use crate::adapters::csv_table::{read_csv, write_csv};
use crate::config::JobConfig;
use crate::core::client::LogHubClient;
use crate::core::operation::Operation;
use crate::domain::model::{OperationOutput, OperationRequest, SaveScenario};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::Result;
use serde_json::Value;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const LINKS_FILE: &str = "links.json";

/// Runs one operation with CSV files as inputs and outputs.
pub struct CsvPipeline<S: Storage> {
    storage: S,
    client: LogHubClient,
    operation: Operation,
    inputs: Vec<(String, String)>,
    parameters: Option<Value>,
    save_scenario: Option<SaveScenario>,
    fetch_links: bool,
    output_path: String,
    zip: bool,
}

impl<S: Storage> CsvPipeline<S> {
    pub fn new(storage: S, client: LogHubClient, operation: Operation) -> Self {
        Self {
            storage,
            client,
            operation,
            inputs: Vec::new(),
            parameters: None,
            save_scenario: None,
            fetch_links: false,
            output_path: "./output".to_string(),
            zip: false,
        }
    }

    pub fn from_job(storage: S, client: LogHubClient, operation: Operation, job: &JobConfig) -> Self {
        let mut pipeline = Self::new(storage, client, operation)
            .output_path(&job.output_path)
            .zip(job.zip)
            .fetch_links(job.fetch_links);
        for (name, path) in &job.inputs {
            pipeline = pipeline.input(name, path);
        }
        pipeline.parameters = job.parameters.clone();
        pipeline.save_scenario = job.save_scenario.clone();
        pipeline
    }

    pub fn input(mut self, name: &str, path: &str) -> Self {
        self.inputs.push((name.to_string(), path.to_string()));
        self
    }

    pub fn parameters(mut self, parameters: Option<Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn save_scenario(mut self, save_scenario: Option<SaveScenario>) -> Self {
        self.save_scenario = save_scenario;
        self
    }

    pub fn fetch_links(mut self, fetch_links: bool) -> Self {
        self.fetch_links = fetch_links;
        self
    }

    pub fn output_path(mut self, output_path: &str) -> Self {
        self.output_path = output_path.trim_end_matches('/').to_string();
        self
    }

    pub fn zip(mut self, zip: bool) -> Self {
        self.zip = zip;
        self
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.output_path, name)
    }

    fn zip_results(&self, output: &OperationOutput) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        for (key, table) in &output.tables {
            zip.start_file::<_, ()>(format!("{}.csv", key), FileOptions::default())?;
            zip.write_all(&write_csv(table)?)?;
        }

        if let Some(links) = &output.links {
            zip.start_file::<_, ()>(LINKS_FILE, FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(links)?.as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for CsvPipeline<S> {
    async fn extract(&self) -> Result<OperationRequest> {
        let mut request = OperationRequest::new()
            .fetch_links(self.fetch_links);
        request.parameters = self.parameters.clone();
        request.save_scenario = self.save_scenario.clone();

        for (name, path) in &self.inputs {
            if !self.operation.inputs().iter().any(|i| &i.name == name) {
                tracing::warn!("Input '{}' is not used by {}", name, self.operation.label());
                continue;
            }
            let data = self.storage.read_file(path).await?;
            let table = read_csv(&data)?;
            tracing::debug!("Loaded {} rows for '{}' from {}", table.len(), name, path);
            request = request.table(name.clone(), table);
        }

        Ok(request)
    }

    async fn execute(&self, request: OperationRequest) -> Result<OperationOutput> {
        self.operation.execute(&self.client, &request).await
    }

    async fn load(&self, output: OperationOutput) -> Result<String> {
        if self.zip {
            let file_name = format!("{}_results.zip", self.operation.name());
            let zip_data = self.zip_results(&output)?;
            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            let path = self.output_file(&file_name);
            self.storage.write_file(&path, &zip_data).await?;
            return Ok(path);
        }

        for (key, table) in &output.tables {
            let path = self.output_file(&format!("{}.csv", key));
            self.storage.write_file(&path, &write_csv(table)?).await?;
            tracing::debug!("Wrote {} rows to {}", table.len(), path);
        }

        if let Some(links) = &output.links {
            let path = self.output_file(LINKS_FILE);
            self.storage
                .write_file(&path, serde_json::to_string_pretty(links)?.as_bytes())
                .await?;
        }

        Ok(self.output_path.clone())
    }
}
