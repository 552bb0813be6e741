//! Raw record -> canonical record coercion

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::types::{fields, CanonicalRecord, RawRecord, TransactionType};

pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Used when `token.decimals` is missing or unparseable
    pub default_decimals: u8,
    /// Drop records whose `transaction_hash` was already seen (keep first)
    pub dedup_by_hash: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_decimals: DEFAULT_DECIMALS,
            dedup_by_hash: false,
        }
    }
}

impl NormalizerConfig {
    /// Paginated sources may repeat items across pages.
    pub fn live() -> Self {
        Self {
            dedup_by_hash: true,
            ..Self::default()
        }
    }
}

pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a batch, preserving input order minus dropped duplicates.
    pub fn normalize(&self, raw: &[RawRecord]) -> Vec<CanonicalRecord> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(raw.len());
        let mut duplicates = 0usize;

        for record in raw {
            let canonical = self.normalize_record(record);
            if self.config.dedup_by_hash {
                if let Some(hash) = &canonical.transaction_hash {
                    if !seen.insert(hash.clone()) {
                        duplicates += 1;
                        continue;
                    }
                }
            }
            out.push(canonical);
        }

        debug!(
            "Normalized {} raw records into {} canonical records ({} duplicates dropped)",
            raw.len(),
            out.len(),
            duplicates
        );
        out
    }

    /// Never fails: malformed fields fall back to their documented defaults.
    pub fn normalize_record(&self, raw: &RawRecord) -> CanonicalRecord {
        let raw_amount = parse_number(raw.get(fields::TOTAL_VALUE)).unwrap_or(0.0);
        let decimals =
            parse_decimals(raw.get(fields::DECIMALS)).unwrap_or(self.config.default_decimals);
        let exchange_rate = parse_number(raw.get(fields::EXCHANGE_RATE)).unwrap_or(0.0);

        let mut record = CanonicalRecord::with_amounts(raw_amount, decimals, exchange_rate);
        record.transaction_hash = parse_text(raw.get(fields::TRANSACTION_HASH));
        record.timestamp = parse_timestamp(raw.get(fields::TIMESTAMP));
        record.token_symbol = parse_text(raw.get(fields::TOKEN_SYMBOL));
        record.transaction_type =
            parse_text(raw.get(fields::TYPE)).map(|t| TransactionType::parse(&t));
        record.from_address = parse_text(raw.get(fields::FROM_HASH));
        record.to_address = parse_text(raw.get(fields::TO_HASH));
        record
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

/// Normalize with default settings (decimals 18, no de-duplication).
pub fn normalize(raw: &[RawRecord]) -> Vec<CanonicalRecord> {
    Normalizer::default().normalize(raw)
}

// =================================================================
// Field Coercion
// =================================================================

fn parse_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_number(value: Option<&Value>) -> Option<f64> {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    // "NaN" and "inf" parse as f64 but are not usable quantities
    n.is_finite().then_some(n)
}

/// Token decimals are an ERC-20 `uint8`; values outside 0..=255 or with a
/// fractional part are treated as unparseable.
fn parse_decimals(value: Option<&Value>) -> Option<u8> {
    let n = parse_number(value)?;
    if n >= 0.0 && n.fract() == 0.0 && n <= u8::MAX as f64 {
        Some(n as u8)
    } else {
        None
    }
}

fn parse_timestamp(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value {
        Some(Value::String(s)) => parse_timestamp_str(s),
        _ => None,
    }
}

/// ISO-8601 parsing. Offsets are converted to UTC and then dropped.
pub fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    // `%#z` also takes `+hhmm` and the hour-only `+hh`
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%#z",
        "%Y-%m-%d %H:%M:%S%.f%#z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_json(&value)
    }

    #[test]
    fn test_full_record() {
        let rec = Normalizer::default().normalize_record(&raw(json!({
            "transaction_hash": "0xaa",
            "timestamp": "2024-03-01T12:30:00.000000Z",
            "token": { "symbol": "XCAP", "decimals": "6", "exchange_rate": "0.25" },
            "total": { "value": "3000000" },
            "from": { "hash": "0x01" },
            "to": { "hash": "0x02" },
            "type": "token_transfer",
            "block_number": 77
        })));

        assert_eq!(rec.transaction_hash.as_deref(), Some("0xaa"));
        assert_eq!(rec.token_symbol.as_deref(), Some("XCAP"));
        assert_eq!(rec.transaction_type, Some(TransactionType::Transfer));
        assert_eq!(rec.decimals, 6);
        assert_eq!(rec.normalized_value, 3.0);
        assert_eq!(rec.usd_value, 0.75);
        assert_eq!(rec.timestamp.map(|t| t.hour()), Some(12));
    }

    #[test]
    fn test_unparseable_decimals_default_to_18() {
        let n = Normalizer::default();
        for bad in [json!("eighteen"), json!(-3), json!(2.5), json!(null), json!("")] {
            let rec = n.normalize_record(&raw(json!({ "token.decimals": bad, "total.value": "1" })));
            assert_eq!(rec.decimals, 18);
        }
        let rec = n.normalize_record(&raw(json!({ "total.value": "1" })));
        assert_eq!(rec.decimals, 18);
    }

    #[test]
    fn test_decimals_beyond_uint8_default_to_18() {
        let n = Normalizer::default();
        for wide in [json!("300"), json!(256)] {
            let rec = n.normalize_record(&raw(json!({ "token.decimals": wide, "total.value": "1" })));
            assert_eq!(rec.decimals, 18);
            assert_eq!(rec.normalized_value, 1e-18);
        }
        let rec = n.normalize_record(&raw(json!({ "token.decimals": 255 })));
        assert_eq!(rec.decimals, 255);
    }

    #[test]
    fn test_integral_float_decimals_accepted() {
        let rec = Normalizer::default().normalize_record(&raw(json!({ "token.decimals": "6.0" })));
        assert_eq!(rec.decimals, 6);
    }

    #[test]
    fn test_unparseable_rate_gives_zero_usd() {
        let n = Normalizer::default();
        for bad in [json!("n/a"), json!("NaN"), json!(null), json!(true)] {
            let rec = n.normalize_record(&raw(json!({
                "total.value": "5000000000000000000",
                "token.exchange_rate": bad
            })));
            assert_eq!(rec.normalized_value, 5.0);
            assert_eq!(rec.exchange_rate, 0.0);
            assert_eq!(rec.usd_value, 0.0);
        }
    }

    #[test]
    fn test_bad_amount_defaults_to_zero() {
        let rec = Normalizer::default().normalize_record(&raw(json!({ "total.value": "lots" })));
        assert_eq!(rec.raw_amount, 0.0);
        assert_eq!(rec.normalized_value, 0.0);
    }

    #[test]
    fn test_bad_timestamp_keeps_record() {
        let out = normalize(&[raw(json!({ "timestamp": "yesterday", "token.symbol": "A" }))]);
        assert_eq!(out.len(), 1);
        assert!(out[0].timestamp.is_none());
        assert_eq!(out[0].token_symbol.as_deref(), Some("A"));
    }

    #[test]
    fn test_timestamp_formats() {
        let utc = parse_timestamp_str("2024-03-01T02:00:00+02:00").unwrap();
        assert_eq!(utc.to_string(), "2024-03-01 00:00:00");
        assert!(parse_timestamp_str("2024-03-01 10:11:12").is_some());
        assert!(parse_timestamp_str("2024-03-01 10:11:12.345").is_some());
        assert_eq!(parse_timestamp_str("2024-03-01").unwrap().to_string(), "2024-03-01 00:00:00");
        assert!(parse_timestamp_str("03/01/2024").is_none());
    }

    #[test]
    fn test_timestamp_compact_and_hour_offsets() {
        let cases = [
            ("2024-03-01T10:11:12+0000", "2024-03-01 10:11:12"),
            ("2024-03-01 10:11:12+0530", "2024-03-01 04:41:12"),
            ("2024-03-01T10:11:12+02", "2024-03-01 08:11:12"),
            ("2024-03-01 10:11:12-03", "2024-03-01 13:11:12"),
            ("2024-03-01 10:11:12Z", "2024-03-01 10:11:12"),
        ];
        for (input, expected) in cases {
            let parsed = parse_timestamp_str(input);
            assert_eq!(parsed.map(|t| t.to_string()).as_deref(), Some(expected), "{}", input);
        }
    }

    #[test]
    fn test_dedup_keeps_first_and_order() {
        let batch = vec![
            raw(json!({ "transaction_hash": "h1", "total.value": "1" })),
            raw(json!({ "transaction_hash": "h2", "total.value": "2" })),
            raw(json!({ "transaction_hash": "h1", "total.value": "3" })),
            raw(json!({ "total.value": "4" })),
            raw(json!({ "total.value": "5" })),
        ];

        let live = Normalizer::new(NormalizerConfig::live()).normalize(&batch);
        let amounts: Vec<f64> = live.iter().map(|r| r.raw_amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0, 4.0, 5.0]);

        let batch_mode = normalize(&batch);
        assert_eq!(batch_mode.len(), 5);
    }

    #[test]
    fn test_custom_default_decimals() {
        let n = Normalizer::new(NormalizerConfig {
            default_decimals: 2,
            dedup_by_hash: false,
        });
        let rec = n.normalize_record(&raw(json!({ "total.value": 150 })));
        assert_eq!(rec.normalized_value, 1.5);
    }
}
