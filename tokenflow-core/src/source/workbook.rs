//! Spreadsheet-backed source
//!
//! Reads the cleaned-records sheet as raw records and the precomputed
//! summary sheets as typed tables.

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::errors::SourceError;
use super::{RecordSource, SourceBatch};
use crate::config::SourceSettings;
use tokenflow_common::data::RawRecord;

/// Sheet names written by the upstream export job
pub mod sheets {
    pub const HOLDER_SUMMARY: &str = "task3_summary_report";
    pub const CLEANED_RECORDS: &str = "Total_cleaned_records";
    pub const VOLUME_PER_DAY: &str = "task4_volume_per_day";
    pub const CUMULATIVE_SUPPLY: &str = "task4_cumulative_supply";
    pub const TOP_TOKENS: &str = "task4_top_tokens";
}

// =============================================================================
// PRECOMPUTED SHEETS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderSheetRow {
    pub address: String,
    #[serde(rename = "Token Holding")]
    pub token_holding: f64,
    #[serde(rename = "% of Total Holding")]
    pub holding_share_pct: f64,
    #[serde(rename = "Tokens Sent")]
    pub tokens_sent: f64,
    #[serde(rename = "% of Total Sent")]
    pub sent_share_pct: f64,
    #[serde(rename = "Tokens Received")]
    pub tokens_received: f64,
    #[serde(rename = "% of Total Received")]
    pub received_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolumeRow {
    pub date: String,
    pub token: String,
    pub daily_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplySheetRow {
    pub date: String,
    #[serde(rename = "token.symbol")]
    pub token_symbol: String,
    pub cumulative_supply: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTokenRow {
    #[serde(rename = "token.symbol")]
    pub token_symbol: String,
    pub total_transferred: f64,
}

/// The summary sheets as exported. A sheet missing from the workbook comes
/// back empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkbookSnapshot {
    pub holders: Vec<HolderSheetRow>,
    pub volume_per_day: Vec<DailyVolumeRow>,
    pub cumulative_supply: Vec<SupplySheetRow>,
    pub top_tokens: Vec<TopTokenRow>,
}

// =============================================================================
// SOURCE
// =============================================================================

#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
    records_sheet: String,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, records_sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            records_sheet: records_sheet.into(),
        }
    }

    pub fn from_settings(settings: &SourceSettings) -> Self {
        Self::new(&settings.workbook_path, &settings.records_sheet)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        read_records_at(&self.path, &self.records_sheet)
    }

    pub fn read_snapshot(&self) -> Result<WorkbookSnapshot, SourceError> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let names = workbook.sheet_names();

        let mut load = |name: &str| -> Result<Option<Range<Data>>, SourceError> {
            if !names.iter().any(|n| n == name) {
                warn!("Sheet '{}' missing from {}", name, self.path.display());
                return Ok(None);
            }
            Ok(Some(workbook.worksheet_range(name)?))
        };

        let holders = load(sheets::HOLDER_SUMMARY)?;
        let volume = load(sheets::VOLUME_PER_DAY)?;
        let supply = load(sheets::CUMULATIVE_SUPPLY)?;
        let top = load(sheets::TOP_TOKENS)?;

        Ok(WorkbookSnapshot {
            holders: holders.as_ref().map(typed_rows).unwrap_or_default(),
            volume_per_day: volume.as_ref().map(typed_rows).unwrap_or_default(),
            cumulative_supply: supply.as_ref().map(typed_rows).unwrap_or_default(),
            top_tokens: top.as_ref().map(typed_rows).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl RecordSource for WorkbookSource {
    fn cache_key(&self) -> String {
        format!("workbook:{}:{}", self.path.display(), self.records_sheet)
    }

    fn describe(&self) -> String {
        format!("workbook {} [{}]", self.path.display(), self.records_sheet)
    }

    async fn fetch(&self) -> SourceBatch {
        let path = self.path.clone();
        let sheet = self.records_sheet.clone();

        match tokio::task::spawn_blocking(move || read_records_at(&path, &sheet)).await {
            Ok(Ok(records)) => {
                info!("Loaded {} records from {}", records.len(), self.describe());
                SourceBatch::complete(records)
            }
            Ok(Err(e)) => {
                warn!("Could not read {}: {}", self.describe(), e);
                SourceBatch::partial(Vec::new(), e.to_string())
            }
            Err(e) => {
                let err = SourceError::Task(e.to_string());
                warn!("Workbook reader task failed: {}", err);
                SourceBatch::partial(Vec::new(), err.to_string())
            }
        }
    }
}

fn read_records_at(path: &Path, sheet: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|n| n == sheet) {
        return Err(SourceError::MissingSheet(sheet.to_string()));
    }
    let range = workbook.worksheet_range(sheet)?;
    Ok(range_to_records(&range))
}

// =============================================================================
// CELL CONVERSION
// =============================================================================

/// First row is the header; every following non-blank row becomes one
/// record keyed by header name. Columns with an empty header are ignored.
pub fn range_to_records(range: &Range<Data>) -> Vec<RawRecord> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(cell_to_header).collect();

    let records: Vec<RawRecord> = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .filter(|(h, _)| !h.is_empty())
                .map(|(h, cell)| (h.clone(), cell_to_value(cell)))
                .collect()
        })
        .collect();

    debug!("Converted {} sheet rows", records.len());
    records
}

fn typed_rows<T: DeserializeOwned>(range: &Range<Data>) -> Vec<T> {
    range_to_records(range)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let row = serde_json::to_value(&record).and_then(serde_json::from_value::<T>);
            match row {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("Skipping sheet row {}: {}", idx + 2, e);
                    None
                }
            }
        })
        .collect()
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => match cell_to_value(other) {
            Value::String(s) => s,
            Value::Null => String::new(),
            v => v.to_string(),
        },
    }
}

/// Excel cell -> JSON scalar the normalizer understands. Date cells become
/// ISO-8601 strings; error cells become null.
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.trim().to_string()),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BatchStatus;
    use serde_json::json;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_cleaned_rows_become_raw_records() {
        let range = sheet(&[
            &[s("transaction_hash"), s("token.symbol"), s("total.value"), s("token.decimals")],
            &[s("0xaa"), s("XCAP"), Data::Float(2500.0), Data::Int(3)],
            &[Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            &[s("0xbb"), s(" USDC "), Data::Error(calamine::CellErrorType::NA), Data::Float(6.0)],
        ]);
        let records = range_to_records(&range);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("total.value"), Some(&json!(2500.0)));
        assert_eq!(records[0].get("token.decimals"), Some(&json!(3)));
        assert_eq!(records[1].get("token.symbol"), Some(&json!("USDC")));
        assert_eq!(records[1].get("total.value"), Some(&Value::Null));
    }

    #[test]
    fn test_typed_sheet_rows_skip_malformed() {
        let range = sheet(&[
            &[s("date"), s("token"), s("daily_volume")],
            &[s("2024-01-01"), s("XCAP"), Data::Float(12.5)],
            &[s("2024-01-02"), s("XCAP"), s("n/a")],
        ]);
        let rows: Vec<DailyVolumeRow> = typed_rows(&range);
        assert_eq!(
            rows,
            vec![DailyVolumeRow {
                date: "2024-01-01".into(),
                token: "XCAP".into(),
                daily_volume: 12.5,
            }]
        );
    }

    #[test]
    fn test_holder_sheet_headers() {
        let range = sheet(&[
            &[
                s("address"),
                s("Token Holding"),
                s("% of Total Holding"),
                s("Tokens Sent"),
                s("% of Total Sent"),
                s("Tokens Received"),
                s("% of Total Received"),
            ],
            &[
                s("0xabc"),
                Data::Float(10.0),
                Data::Float(50.0),
                Data::Int(2),
                Data::Float(20.0),
                Data::Float(1.0),
                Data::Float(5.0),
            ],
        ]);
        let rows: Vec<HolderSheetRow> = typed_rows(&range);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].holding_share_pct, 50.0);
        assert_eq!(rows[0].tokens_sent, 2.0);
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let range = sheet(&[&[s("transaction_hash")]]);
        assert!(range_to_records(&range).is_empty());
        assert!(range_to_records(&Range::<Data>::empty()).is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_yields_empty_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let source = WorkbookSource::new(dir.path().join("missing.xlsx"), sheets::CLEANED_RECORDS);
        let batch = source.fetch().await;
        assert!(batch.records.is_empty());
        assert!(matches!(batch.status, BatchStatus::Partial { .. }));
    }
}
