// service/pipeline.rs
// Source -> normalize -> filter, one pass per request

use std::path::Path;
use tracing::{info, warn};

use super::errors::ServiceError;
use crate::config::AnalyticsSettings;
use crate::report::Report;
use crate::source::{BatchStatus, RecordSource, SourceBatch};
use tokenflow_common::data::{
    export_csv_file, CanonicalRecord, Normalizer, NormalizerConfig, RecordFilter,
};

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub status: BatchStatus,
    pub raw_count: usize,
    /// Every normalized record, before filtering
    pub records: Vec<CanonicalRecord>,
    /// The filtered subset
    pub view: Vec<CanonicalRecord>,
}

impl PipelineOutput {
    pub fn is_partial(&self) -> bool {
        !self.status.is_complete()
    }

    /// Write the filtered view as CSV. Returns the number of rows written.
    pub fn export_view<P: AsRef<Path>>(&self, path: P) -> Result<usize, ServiceError> {
        Ok(export_csv_file(&self.view, path)?)
    }

    /// Render a report over the filtered view.
    pub fn render(&self, report: &dyn Report, settings: &AnalyticsSettings) -> Result<String, ServiceError> {
        Ok(report.render(&self.view, settings)?)
    }
}

pub struct Pipeline {
    normalizer: Normalizer,
}

impl Pipeline {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    pub async fn run(&self, source: &dyn RecordSource, filter: &RecordFilter) -> PipelineOutput {
        info!("Loading records from {}", source.describe());
        let batch = source.fetch().await;
        self.process(batch, filter)
    }

    /// Pure over the batch; a partial batch is processed like any other.
    pub fn process(&self, batch: SourceBatch, filter: &RecordFilter) -> PipelineOutput {
        if let BatchStatus::Partial { reason } = &batch.status {
            warn!("Working with a partial batch ({} records): {}", batch.records.len(), reason);
        }

        let raw_count = batch.records.len();
        let records = self.normalizer.normalize(&batch.records);
        let view = if filter.is_unrestricted() {
            records.clone()
        } else {
            filter.apply(&records)
        };

        info!(
            "Pipeline: {} raw, {} normalized, {} in view",
            raw_count,
            records.len(),
            view.len()
        );

        PipelineOutput {
            status: batch.status,
            raw_count,
            records,
            view,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}
