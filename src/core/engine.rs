use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct RunEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> RunEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Extract, execute and load in order. Returns where the results were written.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting run...");

        tracing::info!("Reading inputs...");
        let request = self.pipeline.extract().await?;
        let rows: usize = request.tables.values().map(|t| t.len()).sum();
        tracing::info!(
            "Read {} input tables with {} rows",
            request.tables.len(),
            rows
        );

        tracing::info!("Calling the application...");
        let output = self.pipeline.execute(request).await?;
        tracing::info!("Received {} result tables", output.tables.len());

        tracing::info!("Writing results...");
        let output_path = self.pipeline.load(output).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
