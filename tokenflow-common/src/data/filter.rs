//! Conjunctive record filter

use chrono::NaiveDate;

use super::types::{CanonicalRecord, NumericField, TransactionType};

/// Wildcard sentinel accepted from user input
pub const ALL: &str = "All";

/// Exact-match criterion or wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// `"All"` and the empty string mean "no restriction".
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == ALL {
            Selection::All
        } else {
            Selection::Only(s.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }

    fn matches_type(&self, value: Option<&TransactionType>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(&TransactionType::parse(wanted)),
        }
    }
}

impl From<&str> for Selection {
    fn from(s: &str) -> Self {
        Selection::parse(s)
    }
}

impl From<Option<String>> for Selection {
    fn from(s: Option<String>) -> Self {
        s.map(|v| Selection::parse(&v)).unwrap_or_default()
    }
}

/// Inclusive bounds on one numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub field: NumericField,
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    fn contains(&self, record: &CanonicalRecord) -> bool {
        let v = record.numeric(self.field);
        v >= self.min && v <= self.max
    }
}

/// All supplied criteria are ANDed; unset criteria are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub token_symbol: Selection,
    pub transaction_type: Selection,
    /// Inclusive `[start, end]` on the date part of the timestamp
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub numeric_range: Option<NumericRange>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, symbol: impl Into<Selection>) -> Self {
        self.token_symbol = symbol.into();
        self
    }

    pub fn transaction_type(mut self, kind: impl Into<Selection>) -> Self {
        self.transaction_type = kind.into();
        self
    }

    pub fn between_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn in_range(mut self, field: NumericField, min: f64, max: f64) -> Self {
        self.numeric_range = Some(NumericRange { field, min, max });
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.token_symbol.is_all()
            && self.transaction_type.is_all()
            && self.date_range.is_none()
            && self.numeric_range.is_none()
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        if !self.token_symbol.matches(record.token_symbol.as_deref()) {
            return false;
        }
        if !self.transaction_type.matches_type(record.transaction_type.as_ref()) {
            return false;
        }
        if let Some((start, end)) = self.date_range {
            // a null timestamp cannot satisfy a range test
            match record.date() {
                Some(d) if d >= start && d <= end => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.numeric_range {
            if !range.contains(record) {
                return false;
            }
        }
        true
    }

    /// Returns a new sequence; the input is left untouched.
    pub fn apply(&self, records: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

pub fn filter(records: &[CanonicalRecord], predicate: &RecordFilter) -> Vec<CanonicalRecord> {
    predicate.apply(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> Vec<CanonicalRecord> {
        vec![
            CanonicalRecord::with_amounts(1.0, 0, 0.1)
                .symbol("AAA")
                .kind(TransactionType::Transfer)
                .at(ts("2024-01-01 10:00:00")),
            CanonicalRecord::with_amounts(2.0, 0, 0.5)
                .symbol("BBB")
                .kind(TransactionType::Minting)
                .at(ts("2024-01-02 23:59:59")),
            CanonicalRecord::with_amounts(3.0, 0, 0.9)
                .symbol("AAA")
                .kind(TransactionType::Burning)
                .at(ts("2024-01-05 00:00:00")),
            CanonicalRecord::with_amounts(4.0, 0, 0.5).symbol("AAA").kind(TransactionType::Transfer),
            CanonicalRecord::with_amounts(5.0, 0, 0.5).kind(TransactionType::Transfer),
        ]
    }

    fn amounts(records: &[CanonicalRecord]) -> Vec<f64> {
        records.iter().map(|r| r.raw_amount).collect()
    }

    #[test]
    fn test_unrestricted_keeps_everything() {
        let records = fixture();
        let f = RecordFilter::new().token("All").transaction_type("");
        assert!(f.is_unrestricted());
        assert_eq!(f.apply(&records), records);
    }

    #[test]
    fn test_symbol_and_type() {
        let records = fixture();
        let out = RecordFilter::new()
            .token("AAA")
            .transaction_type("token_transfer")
            .apply(&records);
        assert_eq!(amounts(&out), vec![1.0, 4.0]);
    }

    #[test]
    fn test_short_type_name_matches() {
        let out = RecordFilter::new().transaction_type("minting").apply(&fixture());
        assert_eq!(amounts(&out), vec![2.0]);
    }

    #[test]
    fn test_date_range_inclusive_and_excludes_null_timestamps() {
        let out = RecordFilter::new()
            .between_dates(d("2024-01-02"), d("2024-01-05"))
            .apply(&fixture());
        assert_eq!(amounts(&out), vec![2.0, 3.0]);
    }

    #[test]
    fn test_numeric_range_inclusive() {
        let out = RecordFilter::new()
            .in_range(NumericField::ExchangeRate, 0.5, 0.9)
            .apply(&fixture());
        assert_eq!(amounts(&out), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = fixture();
        let p = RecordFilter::new()
            .token("AAA")
            .between_dates(d("2024-01-01"), d("2024-01-31"));
        let once = filter(&records, &p);
        let twice = filter(&once, &p);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sequential_filters_compose() {
        let records = fixture();
        let by_token = RecordFilter::new().token("AAA");
        let by_rate = RecordFilter::new().in_range(NumericField::ExchangeRate, 0.4, 1.0);
        let combined = RecordFilter::new()
            .token("AAA")
            .in_range(NumericField::ExchangeRate, 0.4, 1.0);

        let chained = filter(&filter(&records, &by_token), &by_rate);
        assert_eq!(chained, filter(&records, &combined));
        assert_eq!(amounts(&chained), vec![3.0, 4.0]);
    }

    #[test]
    fn test_input_not_mutated() {
        let records = fixture();
        let before = records.clone();
        let _ = RecordFilter::new().token("BBB").apply(&records);
        assert_eq!(records, before);
    }
}
