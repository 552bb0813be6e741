// tokenflow-core/src/lib.rs
// Configuration, record sources, pipeline orchestration and text reports

pub mod config;
pub mod report;
pub mod service;
pub mod source;

// Re-export tokenflow-common for convenience
pub use tokenflow_common::{analytics, data};
