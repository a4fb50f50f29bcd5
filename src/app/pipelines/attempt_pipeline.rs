use crate::core::flatten::flatten;
use crate::core::{AttemptSource, Pipeline, RecordSink, TransformResult};
use crate::utils::error::Result;

/// Attempts API → flattened rows → sink.
pub struct AttemptPipeline<F: AttemptSource, K: RecordSink> {
    pub(crate) source: F,
    pub(crate) sink: K,
}

impl<F: AttemptSource, K: RecordSink> AttemptPipeline<F, K> {
    pub fn new(source: F, sink: K) -> Self {
        Self { source, sink }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

#[async_trait::async_trait]
impl<F: AttemptSource, K: RecordSink> Pipeline for AttemptPipeline<F, K> {
    async fn extract(&self) -> Result<serde_json::Value> {
        self.source.fetch().await
    }

    async fn transform(&self, data: serde_json::Value) -> Result<TransformResult> {
        flatten(&data)
    }

    async fn load(&self, result: TransformResult) -> Result<u64> {
        self.sink.write(&result.records).await
    }
}
