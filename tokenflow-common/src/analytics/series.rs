//! Time-bucketed volume, cumulative supply and rolling averages

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::errors::{AnalyticsError, AnalyticsResult};
use crate::data::types::{CanonicalRecord, NumericField, TransactionType};

// =================================================================
// Granularity
// =================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Day,
    /// ISO week, starting Monday
    Week,
    /// Calendar month, starting on the 1st
    Month,
}

impl Granularity {
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Granularity::Month => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl FromStr for Granularity {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "unknown granularity '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =================================================================
// Time Series
// =================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub bucket_start: NaiveDate,
    pub token_symbol: String,
    pub value: f64,
}

/// Sum `field` per (bucket, token). Sparse: empty buckets are not emitted.
/// Records without timestamp or symbol are skipped. Ordered by bucket, then
/// token.
pub fn time_series(
    records: &[CanonicalRecord],
    granularity: Granularity,
    field: NumericField,
) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();

    for record in records {
        let (Some(date), Some(symbol)) = (record.date(), record.token_symbol.as_ref()) else {
            continue;
        };
        *buckets
            .entry((granularity.bucket_start(date), symbol.clone()))
            .or_insert(0.0) += record.numeric(field);
    }

    buckets
        .into_iter()
        .map(|((bucket_start, token_symbol), value)| TimeSeriesPoint {
            bucket_start,
            token_symbol,
            value,
        })
        .collect()
}

// =================================================================
// Cumulative Supply
// =================================================================

/// What counts towards a token's supply on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyDefinition {
    /// Minted value minus burned value; transfers do not change supply
    #[default]
    NetMintBurn,
    /// Normalized value of every record regardless of type
    TransferVolume,
}

impl SupplyDefinition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyDefinition::NetMintBurn => "net_mint_burn",
            SupplyDefinition::TransferVolume => "transfer_volume",
        }
    }

    fn contribution(&self, record: &CanonicalRecord) -> Option<f64> {
        match self {
            SupplyDefinition::NetMintBurn => match record.transaction_type {
                Some(TransactionType::Minting) => Some(record.normalized_value),
                Some(TransactionType::Burning) => Some(-record.normalized_value),
                _ => None,
            },
            SupplyDefinition::TransferVolume => Some(record.normalized_value),
        }
    }
}

impl FromStr for SupplyDefinition {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net_mint_burn" => Ok(SupplyDefinition::NetMintBurn),
            "transfer_volume" => Ok(SupplyDefinition::TransferVolume),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "unknown supply definition '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeSupplyPoint {
    pub date: NaiveDate,
    pub token_symbol: String,
    pub daily_net: f64,
    pub cumulative: f64,
}

/// Running total of per-day net value, computed per token independently.
/// Ordered by token, then date ascending. Only days with contributing
/// records are emitted.
pub fn cumulative_supply(
    records: &[CanonicalRecord],
    definition: SupplyDefinition,
) -> Vec<CumulativeSupplyPoint> {
    let mut per_token: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for record in records {
        let (Some(date), Some(symbol)) = (record.date(), record.token_symbol.as_ref()) else {
            continue;
        };
        if let Some(delta) = definition.contribution(record) {
            *per_token
                .entry(symbol.clone())
                .or_default()
                .entry(date)
                .or_insert(0.0) += delta;
        }
    }

    let mut out = Vec::new();
    for (token_symbol, days) in per_token {
        let mut running = 0.0;
        for (date, daily_net) in days {
            running += daily_net;
            out.push(CumulativeSupplyPoint {
                date,
                token_symbol: token_symbol.clone(),
                daily_net,
                cumulative: running,
            });
        }
    }
    out
}

// =================================================================
// Rolling Average
// =================================================================

/// Trailing count-based window: each output averages up to the last
/// `window` values ending at that position, `None` while fewer than
/// `min_periods` values are available.
pub fn rolling_average(
    values: &[f64],
    window: usize,
    min_periods: usize,
) -> AnalyticsResult<Vec<Option<f64>>> {
    if window == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "rolling window must be at least 1".into(),
        ));
    }
    if min_periods > window {
        return Err(AnalyticsError::InvalidParameter(format!(
            "min_periods {} exceeds window {}",
            min_periods, window
        )));
    }

    Ok((0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            if slice.len() >= min_periods {
                Some(slice.iter().sum::<f64>() / slice.len() as f64)
            } else {
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    pub bucket_start: NaiveDate,
    pub token_symbol: String,
    pub value: f64,
    pub rolling_average: Option<f64>,
}

/// `rolling_average` applied to each token's points separately. Output
/// keeps the order of `points`.
pub fn rolling_average_by_token(
    points: &[TimeSeriesPoint],
    window: usize,
    min_periods: usize,
) -> AnalyticsResult<Vec<RollingPoint>> {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, p) in points.iter().enumerate() {
        groups.entry(p.token_symbol.as_str()).or_default().push(idx);
    }

    let mut averages: Vec<Option<f64>> = vec![None; points.len()];
    for indices in groups.values() {
        let values: Vec<f64> = indices.iter().map(|&i| points[i].value).collect();
        let rolled = rolling_average(&values, window, min_periods)?;
        for (&i, avg) in indices.iter().zip(rolled) {
            averages[i] = avg;
        }
    }

    Ok(points
        .iter()
        .zip(averages)
        .map(|(p, rolling_average)| RollingPoint {
            bucket_start: p.bucket_start,
            token_symbol: p.token_symbol.clone(),
            value: p.value,
            rolling_average,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(symbol: &str, ts: &str, v: f64, kind: TransactionType) -> CanonicalRecord {
        CanonicalRecord::with_amounts(v, 0, 1.0)
            .symbol(symbol)
            .kind(kind)
            .at(NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[test]
    fn test_bucket_boundaries() {
        // 2024-01-10 is a Wednesday
        assert_eq!(Granularity::Day.bucket_start(d("2024-01-10")), d("2024-01-10"));
        assert_eq!(Granularity::Week.bucket_start(d("2024-01-10")), d("2024-01-08"));
        assert_eq!(Granularity::Week.bucket_start(d("2024-01-08")), d("2024-01-08"));
        assert_eq!(Granularity::Week.bucket_start(d("2024-01-14")), d("2024-01-08"));
        assert_eq!(Granularity::Month.bucket_start(d("2024-02-29")), d("2024-02-01"));
    }

    #[test]
    fn test_daily_series_sparse_and_sorted() {
        let records = vec![
            rec("BBB", "2024-01-02 10:00:00", 5.0, TransactionType::Transfer),
            rec("AAA", "2024-01-02 11:00:00", 1.0, TransactionType::Transfer),
            rec("AAA", "2024-01-02 12:00:00", 2.0, TransactionType::Minting),
            rec("AAA", "2024-01-05 00:00:00", 4.0, TransactionType::Transfer),
        ];
        let series = time_series(&records, Granularity::Day, NumericField::NormalizedValue);

        let flat: Vec<(NaiveDate, &str, f64)> = series
            .iter()
            .map(|p| (p.bucket_start, p.token_symbol.as_str(), p.value))
            .collect();
        assert_eq!(
            flat,
            vec![
                (d("2024-01-02"), "AAA", 3.0),
                (d("2024-01-02"), "BBB", 5.0),
                (d("2024-01-05"), "AAA", 4.0),
            ]
        );
    }

    #[test]
    fn test_weekly_and_monthly_series() {
        let records = vec![
            rec("AAA", "2024-01-29 10:00:00", 1.0, TransactionType::Transfer),
            rec("AAA", "2024-02-02 10:00:00", 2.0, TransactionType::Transfer),
        ];
        let weekly = time_series(&records, Granularity::Week, NumericField::NormalizedValue);
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].bucket_start, d("2024-01-29"));
        assert_eq!(weekly[0].value, 3.0);

        let monthly = time_series(&records, Granularity::Month, NumericField::NormalizedValue);
        assert_eq!(monthly.len(), 2);
    }

    #[test]
    fn test_cumulative_supply_per_token() {
        let records = vec![
            rec("AAA", "2024-01-03 00:00:00", 10.0, TransactionType::Minting),
            rec("BBB", "2024-01-01 00:00:00", 100.0, TransactionType::Minting),
            rec("AAA", "2024-01-01 00:00:00", 5.0, TransactionType::Minting),
            rec("AAA", "2024-01-03 09:00:00", 3.0, TransactionType::Burning),
            rec("AAA", "2024-01-04 09:00:00", 50.0, TransactionType::Transfer),
        ];
        let supply = cumulative_supply(&records, SupplyDefinition::NetMintBurn);

        let flat: Vec<(&str, NaiveDate, f64)> = supply
            .iter()
            .map(|p| (p.token_symbol.as_str(), p.date, p.cumulative))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("AAA", d("2024-01-01"), 5.0),
                ("AAA", d("2024-01-03"), 12.0),
                ("BBB", d("2024-01-01"), 100.0),
            ]
        );
    }

    #[test]
    fn test_supply_non_decreasing_without_burns() {
        let records: Vec<CanonicalRecord> = (1..=9)
            .map(|day| {
                rec(
                    "AAA",
                    &format!("2024-03-0{} 00:00:00", day),
                    (day % 3) as f64,
                    TransactionType::Minting,
                )
            })
            .collect();
        let supply = cumulative_supply(&records, SupplyDefinition::NetMintBurn);
        assert!(supply.windows(2).all(|w| w[1].cumulative >= w[0].cumulative));
    }

    #[test]
    fn test_transfer_volume_definition() {
        let records = vec![
            rec("AAA", "2024-01-01 00:00:00", 2.0, TransactionType::Transfer),
            rec("AAA", "2024-01-02 00:00:00", 3.0, TransactionType::Burning),
        ];
        let supply = cumulative_supply(&records, SupplyDefinition::TransferVolume);
        assert_eq!(supply.last().unwrap().cumulative, 5.0);
    }

    #[test]
    fn test_rolling_average_min_periods_one() {
        let out = rolling_average(&[10.0, 20.0, 30.0], 7, 1).unwrap();
        assert_eq!(out, vec![Some(10.0), Some(15.0), Some(20.0)]);
    }

    #[test]
    fn test_rolling_average_window_and_min_periods() {
        let out = rolling_average(&[1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_rolling_average_rejects_bad_params() {
        assert!(rolling_average(&[1.0], 0, 0).is_err());
        assert!(rolling_average(&[1.0], 2, 3).is_err());
    }

    #[test]
    fn test_rolling_average_independent_per_token() {
        let points = vec![
            TimeSeriesPoint { bucket_start: d("2024-01-01"), token_symbol: "A".into(), value: 10.0 },
            TimeSeriesPoint { bucket_start: d("2024-01-01"), token_symbol: "B".into(), value: 1000.0 },
            TimeSeriesPoint { bucket_start: d("2024-01-02"), token_symbol: "A".into(), value: 20.0 },
            TimeSeriesPoint { bucket_start: d("2024-01-03"), token_symbol: "A".into(), value: 30.0 },
        ];
        let rolled = rolling_average_by_token(&points, 7, 1).unwrap();
        let avgs: Vec<Option<f64>> = rolled.iter().map(|p| p.rolling_average).collect();
        assert_eq!(avgs, vec![Some(10.0), Some(1000.0), Some(15.0), Some(20.0)]);
    }
}
