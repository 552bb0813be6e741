// source/errors.rs

use thiserror::Error;

/// Error types for record acquisition
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Data parsing error: {0}")]
    Parse(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    #[error("Task error: {0}")]
    Task(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<calamine::Error> for SourceError {
    fn from(err: calamine::Error) -> Self {
        SourceError::Workbook(err.to_string())
    }
}
