//! General cross-tabulation

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use super::errors::AnalyticsError;
use crate::data::types::{CanonicalRecord, GroupField, NumericField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggFunc {
    #[default]
    Sum,
    Count,
    Mean,
}

impl FromStr for AggFunc {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(AggFunc::Sum),
            "count" => Ok(AggFunc::Count),
            "mean" | "avg" => Ok(AggFunc::Mean),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "unknown aggregation '{}'",
                other
            ))),
        }
    }
}

/// Row key -> column key -> value. Every row carries every column; absent
/// combinations hold 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    cells: BTreeMap<String, BTreeMap<String, f64>>,
    columns: BTreeSet<String>,
}

impl PivotTable {
    pub fn get(&self, row: &str, col: &str) -> f64 {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn row(&self, row: &str) -> Option<&BTreeMap<String, f64>> {
        self.cells.get(row)
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.cells
    }
}

pub fn pivot(
    records: &[CanonicalRecord],
    row_key: GroupField,
    col_key: GroupField,
    value: NumericField,
    agg: AggFunc,
) -> PivotTable {
    // (sum, count) per cell, accumulated in record order
    let mut acc: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
    let mut columns: BTreeSet<String> = BTreeSet::new();

    for record in records {
        let (Some(row), Some(col)) = (record.group_key(row_key), record.group_key(col_key)) else {
            continue;
        };
        columns.insert(col.clone());
        let cell = acc.entry(row).or_default().entry(col).or_insert((0.0, 0));
        cell.0 += record.numeric(value);
        cell.1 += 1;
    }

    let cells = acc
        .into_iter()
        .map(|(row, cols)| {
            let filled: BTreeMap<String, f64> = columns
                .iter()
                .map(|c| {
                    let v = match cols.get(c) {
                        Some(&(sum, count)) => match agg {
                            AggFunc::Sum => sum,
                            AggFunc::Count => count as f64,
                            AggFunc::Mean => sum / count as f64,
                        },
                        None => 0.0,
                    };
                    (c.clone(), v)
                })
                .collect();
            (row, filled)
        })
        .collect();

    PivotTable { cells, columns }
}
