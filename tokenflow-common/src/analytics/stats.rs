//! Percentile thresholds, anomaly sets and histograms

use serde::Serialize;
use std::cmp::Ordering;

use super::errors::{AnalyticsError, AnalyticsResult};
use super::ranking::top_records;
use crate::data::types::{CanonicalRecord, NumericField};

pub const DEFAULT_PERCENTILE: f64 = 0.95;

/// Value at quantile `q` using linear interpolation between the closest
/// order statistics. `None` for an empty input.
pub fn percentile(values: &[f64], q: f64) -> AnalyticsResult<Option<f64>> {
    if !(0.0..=1.0).contains(&q) {
        return Err(AnalyticsError::InvalidParameter(format!(
            "percentile {} outside [0, 1]",
            q
        )));
    }
    if values.is_empty() {
        return Ok(None);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Ok(Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac))
}

pub fn percentile_threshold(
    records: &[CanonicalRecord],
    field: NumericField,
    q: f64,
) -> AnalyticsResult<Option<f64>> {
    let values: Vec<f64> = records.iter().map(|r| r.numeric(field)).collect();
    percentile(&values, q)
}

/// Records whose `field` strictly exceeds the percentile threshold,
/// largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalySet {
    pub field: NumericField,
    pub threshold: Option<f64>,
    pub records: Vec<CanonicalRecord>,
}

impl AnomalySet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn anomalies(
    records: &[CanonicalRecord],
    field: NumericField,
    q: f64,
) -> AnalyticsResult<AnomalySet> {
    let threshold = percentile_threshold(records, field, q)?;
    let above: Vec<CanonicalRecord> = match threshold {
        Some(t) => records
            .iter()
            .filter(|r| r.numeric(field) > t)
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    let count = above.len();

    Ok(AnomalySet {
        field,
        threshold,
        records: top_records(&above, field, count),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over the observed range; the last bin is closed on
/// both ends. A degenerate range is widened by 0.5 on each side.
pub fn histogram(
    records: &[CanonicalRecord],
    field: NumericField,
    bins: usize,
) -> AnalyticsResult<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "histogram needs at least one bin".into(),
        ));
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<f64> = records.iter().map(|r| r.numeric(field)).collect();
    let mut min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(vs: &[f64]) -> Vec<CanonicalRecord> {
        vs.iter().map(|&v| CanonicalRecord::with_amounts(v, 0, 1.0)).collect()
    }

    #[test]
    fn test_percentile_linear_interpolation_twenty_records() {
        // deliberately unsorted: 1..=20 shuffled
        let vs = [
            7.0, 3.0, 20.0, 1.0, 15.0, 9.0, 12.0, 2.0, 18.0, 5.0, 11.0, 4.0, 19.0, 6.0, 14.0,
            8.0, 17.0, 10.0, 16.0, 13.0,
        ];
        let t = percentile_threshold(&values(&vs), NumericField::NormalizedValue, 0.95)
            .unwrap()
            .unwrap();
        // position 0.95 * 19 = 18.05 -> 19 + 0.05 * (20 - 19)
        assert!((t - 19.05).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_edges() {
        assert_eq!(percentile(&[4.0, 1.0, 3.0], 0.0).unwrap(), Some(1.0));
        assert_eq!(percentile(&[4.0, 1.0, 3.0], 1.0).unwrap(), Some(4.0));
        assert_eq!(percentile(&[4.0, 1.0, 3.0], 0.5).unwrap(), Some(3.0));
        assert_eq!(percentile(&[], 0.5).unwrap(), None);
        assert!(percentile(&[1.0], 1.5).is_err());
    }

    #[test]
    fn test_anomaly_set_strictly_above_threshold() {
        let vs: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let set = anomalies(&values(&vs), NumericField::NormalizedValue, 0.95).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].normalized_value, 20.0);
    }

    #[test]
    fn test_anomalies_empty_input() {
        let set = anomalies(&[], NumericField::UsdValue, 0.95).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.threshold, None);
    }

    #[test]
    fn test_histogram_counts() {
        let bins = histogram(&values(&[0.0, 1.0, 2.0, 3.0, 4.0]), NumericField::NormalizedValue, 2).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 3);
        assert_eq!(bins[1].upper, 4.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&values(&[7.0, 7.0]), NumericField::NormalizedValue, 4).unwrap();
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(bins[0].lower, 6.5);
    }
}
