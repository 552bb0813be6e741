// analytics/errors.rs

use thiserror::Error;

/// Error types for analytics queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
