use crate::domain::model::{OperationOutput, OperationRequest, PollingPolicy, RetryPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_server(&self) -> &str;
    fn api_key(&self) -> &str;
    fn retry_policy(&self) -> RetryPolicy;
    fn polling_policy(&self) -> PollingPolicy;
    fn request_timeout(&self) -> Option<Duration>;
}

/// One operation run: gather inputs, call the application, persist the results.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<OperationRequest>;
    async fn execute(&self, request: OperationRequest) -> Result<OperationOutput>;
    async fn load(&self, output: OperationOutput) -> Result<String>;
}
