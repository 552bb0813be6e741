use thiserror::Error;
use tokenflow_common::analytics::AnalyticsError;
use tokenflow_common::data::DataError;

/// Service layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Unknown report: {0}")]
    UnknownReport(String),
}
