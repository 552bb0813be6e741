//! CSV export of canonical records

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::types::{CanonicalRecord, DataResult};

pub const EXPORT_HEADER: [&str; 11] = [
    "transaction_hash",
    "timestamp",
    "token_symbol",
    "transaction_type",
    "from_address",
    "to_address",
    "raw_amount",
    "decimals",
    "normalized_value",
    "exchange_rate",
    "usd_value",
];

#[derive(Serialize)]
struct ExportRow<'a> {
    transaction_hash: Option<&'a str>,
    timestamp: Option<String>,
    token_symbol: Option<&'a str>,
    transaction_type: Option<&'a str>,
    from_address: Option<&'a str>,
    to_address: Option<&'a str>,
    raw_amount: f64,
    decimals: u8,
    normalized_value: f64,
    exchange_rate: f64,
    usd_value: f64,
}

impl<'a> From<&'a CanonicalRecord> for ExportRow<'a> {
    fn from(r: &'a CanonicalRecord) -> Self {
        Self {
            transaction_hash: r.transaction_hash.as_deref(),
            timestamp: r.timestamp.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            token_symbol: r.token_symbol.as_deref(),
            transaction_type: r.transaction_type.as_ref().map(|t| t.as_str()),
            from_address: r.from_address.as_deref(),
            to_address: r.to_address.as_deref(),
            raw_amount: r.raw_amount,
            decimals: r.decimals,
            normalized_value: r.normalized_value,
            exchange_rate: r.exchange_rate,
            usd_value: r.usd_value,
        }
    }
}

/// Write header plus one row per record. The header is written even when
/// there are no records. Returns the number of data rows.
pub fn write_csv<W: Write>(records: &[CanonicalRecord], writer: W) -> DataResult<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(EXPORT_HEADER)?;
    for record in records {
        wtr.serialize(ExportRow::from(record))?;
    }
    wtr.flush()?;
    Ok(records.len())
}

pub fn to_csv_string(records: &[CanonicalRecord]) -> DataResult<String> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    // csv only emits valid UTF-8 for UTF-8 input
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn export_csv_file<P: AsRef<Path>>(records: &[CanonicalRecord], path: P) -> DataResult<usize> {
    let file = File::create(path.as_ref())?;
    let rows = write_csv(records, file)?;
    info!("Exported {} records to {}", rows, path.as_ref().display());
    Ok(rows)
}
