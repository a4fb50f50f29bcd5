use crate::domain::model::{FlattenedRecord, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where raw attempt JSON comes from.
#[async_trait]
pub trait AttemptSource: Send + Sync {
    async fn fetch(&self) -> Result<serde_json::Value>;
}

/// Where flattened rows go. Returns the number of rows written.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write(&self, records: &[FlattenedRecord]) -> Result<u64>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<serde_json::Value>;
    async fn transform(&self, data: serde_json::Value) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<u64>;
}
