// tokenflow-core/src/source/mod.rs
// Raw record acquisition: explorer pager, workbook reader, TTL cache

pub mod cache;
pub mod errors;
pub mod explorer;
pub mod workbook;

use async_trait::async_trait;
use tokenflow_common::data::RawRecord;

pub use cache::{CachedSource, TtlCache};
pub use errors::SourceError;
pub use explorer::{ExplorerSource, HttpPageFetcher, PageFetcher};
pub use workbook::{WorkbookSnapshot, WorkbookSource};

/// Whether a source delivered everything it meant to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Complete,
    /// Terminated early; the records gathered so far are still returned
    Partial { reason: String },
}

impl BatchStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, BatchStatus::Complete)
    }
}

#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub records: Vec<RawRecord>,
    pub status: BatchStatus,
}

impl SourceBatch {
    pub fn complete(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            status: BatchStatus::Complete,
        }
    }

    pub fn partial(records: Vec<RawRecord>, reason: impl Into<String>) -> Self {
        Self {
            records,
            status: BatchStatus::Partial {
                reason: reason.into(),
            },
        }
    }
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Identifies the fetch parameters; equal keys mean interchangeable batches.
    fn cache_key(&self) -> String;

    fn describe(&self) -> String;

    /// Never fails outright: an unreachable source yields a partial
    /// (possibly empty) batch.
    async fn fetch(&self) -> SourceBatch;
}
