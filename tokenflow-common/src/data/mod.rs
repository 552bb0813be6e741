pub mod export;
pub mod filter;
pub mod normalizer;
pub mod types;

pub use export::{export_csv_file, to_csv_string, write_csv};
pub use filter::{filter, NumericRange, RecordFilter, Selection};
pub use normalizer::{normalize, Normalizer, NormalizerConfig, DEFAULT_DECIMALS};
pub use types::{
    CanonicalRecord, DataError, DataResult, GroupField, NumericField, RawRecord, TransactionType,
};
