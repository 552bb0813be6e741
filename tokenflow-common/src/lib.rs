// tokenflow-common/src/lib.rs
// Token transfer normalization, filtering and analytics

pub mod analytics;
pub mod data;

pub use data::{CanonicalRecord, RawRecord, RecordFilter};
