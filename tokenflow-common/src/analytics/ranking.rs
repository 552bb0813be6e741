//! Grouped top-N rankings

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::data::types::{CanonicalRecord, GroupField, NumericField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup {
    pub key: String,
    pub value: f64,
}

/// Sum `value` per `group`, sort stably and keep the first `n`.
/// Ties keep first-seen order; records without a group key are skipped.
pub fn top_n(
    records: &[CanonicalRecord],
    group: GroupField,
    value: NumericField,
    n: usize,
    order: SortOrder,
) -> Vec<RankedGroup> {
    let groups = accumulate(records, group, |r| r.numeric(value));
    rank(groups, n, order)
}

/// Like `top_n` but ranks by number of records per group.
pub fn top_n_by_count(
    records: &[CanonicalRecord],
    group: GroupField,
    n: usize,
    order: SortOrder,
) -> Vec<RankedGroup> {
    let groups = accumulate(records, group, |_| 1.0);
    rank(groups, n, order)
}

/// The `n` records with the largest `field`, stable on ties.
pub fn top_records(records: &[CanonicalRecord], field: NumericField, n: usize) -> Vec<CanonicalRecord> {
    let mut sorted: Vec<&CanonicalRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.numeric(field)
            .partial_cmp(&a.numeric(field))
            .unwrap_or(Ordering::Equal)
    });
    sorted.into_iter().take(n).cloned().collect()
}

fn accumulate<F>(records: &[CanonicalRecord], group: GroupField, value: F) -> Vec<RankedGroup>
where
    F: Fn(&CanonicalRecord) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RankedGroup> = Vec::new();

    for record in records {
        let Some(key) = record.group_key(group) else {
            continue;
        };
        let idx = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(RankedGroup { key, value: 0.0 });
            groups.len() - 1
        });
        groups[idx].value += value(record);
    }
    groups
}

fn rank(mut groups: Vec<RankedGroup>, n: usize, order: SortOrder) -> Vec<RankedGroup> {
    groups.sort_by(|a, b| {
        let ord = match order {
            SortOrder::Descending => b.value.partial_cmp(&a.value),
            SortOrder::Ascending => a.value.partial_cmp(&b.value),
        };
        ord.unwrap_or(Ordering::Equal)
    });
    groups.truncate(n);
    groups
}
