//! Headline metrics and mint/burn activity

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::data::types::{CanonicalRecord, TransactionType};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryMetrics {
    /// Minted minus burned, in normalized units
    pub total_supply: f64,
    pub unique_tokens: usize,
    pub total_transactions: usize,
    pub tokens_minted: f64,
    pub tokens_burned: f64,
    pub tokens_transferred: f64,
    pub total_usd_volume: f64,
}

impl SummaryMetrics {
    pub fn compute(records: &[CanonicalRecord]) -> Self {
        let mut m = SummaryMetrics {
            total_transactions: records.len(),
            ..Default::default()
        };
        let mut symbols: HashSet<&str> = HashSet::new();

        for r in records {
            if let Some(symbol) = r.token_symbol.as_deref() {
                symbols.insert(symbol);
            }
            match r.transaction_type {
                Some(TransactionType::Minting) => m.tokens_minted += r.normalized_value,
                Some(TransactionType::Burning) => m.tokens_burned += r.normalized_value,
                Some(TransactionType::Transfer) => m.tokens_transferred += r.normalized_value,
                _ => {}
            }
            m.total_usd_volume += r.usd_value;
        }

        m.unique_tokens = symbols.len();
        m.total_supply = m.tokens_minted - m.tokens_burned;
        m
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MintBurnActivity {
    pub date: NaiveDate,
    pub token_symbol: String,
    pub minted: f64,
    pub burned: f64,
}

/// Minted and burned value per (date, token), newest date first, then
/// token ascending. Days with neither are not emitted.
pub fn mint_burn_activity(records: &[CanonicalRecord]) -> Vec<MintBurnActivity> {
    let mut days: BTreeMap<(NaiveDate, String), (f64, f64)> = BTreeMap::new();

    for r in records {
        let (Some(date), Some(symbol)) = (r.date(), r.token_symbol.as_ref()) else {
            continue;
        };
        let slot = match r.transaction_type {
            Some(TransactionType::Minting) | Some(TransactionType::Burning) => {
                days.entry((date, symbol.clone())).or_insert((0.0, 0.0))
            }
            _ => continue,
        };
        if r.is_type(&TransactionType::Minting) {
            slot.0 += r.normalized_value;
        } else {
            slot.1 += r.normalized_value;
        }
    }

    let mut out: Vec<MintBurnActivity> = days
        .into_iter()
        .map(|((date, token_symbol), (minted, burned))| MintBurnActivity {
            date,
            token_symbol,
            minted,
            burned,
        })
        .collect();
    // BTreeMap gives (date asc, symbol asc); flip dates only
    out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.token_symbol.cmp(&b.token_symbol)));
    out
}
