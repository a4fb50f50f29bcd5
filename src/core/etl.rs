use crate::core::Pipeline;
use crate::domain::model::{DegradedStage, RunReport, TransformResult};
use crate::utils::error::Result;
use tracing::Instrument;

/// Runs extract, transform and load once, in order.
///
/// Extract and transform failures are logged and the run continues with an
/// empty batch, so the load stage still ensures the table and writes nothing.
/// A load failure is logged and returned.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        tracing::info!("Starting ETL run");

        let extracted = self
            .pipeline
            .extract()
            .instrument(tracing::info_span!("extract"))
            .await;

        let transformed = match extracted {
            Ok(raw_data) => {
                report.fetched = raw_data.as_array().map_or(0, Vec::len);
                tracing::info!("Fetched {} attempt records", report.fetched);

                match self
                    .pipeline
                    .transform(raw_data)
                    .instrument(tracing::info_span!("transform"))
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!("Could not transform fetched data: {}", e);
                        report.degraded = Some(DegradedStage::Transform);
                        TransformResult::default()
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    "Download failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                report.degraded = Some(DegradedStage::Extract);
                TransformResult::default()
            }
        };

        report.flattened = transformed.records.len();
        report.skipped = transformed.skipped;
        report.passback_errors = transformed.passback_errors;
        tracing::info!(
            "Flattened {} records ({} skipped, {} with bad passback_params)",
            report.flattened,
            report.skipped,
            report.passback_errors
        );

        match self
            .pipeline
            .load(transformed)
            .instrument(tracing::info_span!("load"))
            .await
        {
            Ok(rows) => report.rows_written = rows,
            Err(e) => {
                tracing::error!(
                    "Load failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                return Err(e);
            }
        }

        tracing::info!("ETL run finished: {} rows written", report.rows_written);
        Ok(report)
    }
}
