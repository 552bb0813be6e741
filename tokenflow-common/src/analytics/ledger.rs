//! Per-address net flow ledger

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::data::types::{CanonicalRecord, TransactionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub tokens_sent: f64,
    pub tokens_received: f64,
    pub tokens_minted: f64,
    pub tokens_burned: f64,
}

impl LedgerEntry {
    pub fn token_holding(&self) -> f64 {
        self.tokens_minted - self.tokens_burned + self.tokens_received - self.tokens_sent
    }

    pub fn metric(&self, metric: LedgerMetric) -> f64 {
        match metric {
            LedgerMetric::Holding => self.token_holding(),
            LedgerMetric::Sent => self.tokens_sent,
            LedgerMetric::Received => self.tokens_received,
            LedgerMetric::Minted => self.tokens_minted,
            LedgerMetric::Burned => self.tokens_burned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMetric {
    Holding,
    Sent,
    Received,
    Minted,
    Burned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub address: String,
    #[serde(flatten)]
    pub entry: LedgerEntry,
}

/// One row of the top-holder summary, shares in percent of the ledger total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderSummary {
    pub address: String,
    pub token_holding: f64,
    pub holding_share_pct: f64,
    pub tokens_sent: f64,
    pub sent_share_pct: f64,
    pub tokens_received: f64,
    pub received_share_pct: f64,
}

/// Outer join of sent / received / minted / burned flows over every
/// contributing address. Rows keep first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct AddressLedger {
    rows: Vec<LedgerRow>,
    index: HashMap<String, usize>,
}

impl AddressLedger {
    /// Transfers credit `to` and debit `from`, mints credit `to`, burns
    /// debit `from`. Other types and missing addresses contribute nothing.
    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let mut ledger = Self::default();

        for record in records {
            let value = record.normalized_value;
            match record.transaction_type {
                Some(TransactionType::Transfer) => {
                    if let Some(from) = &record.from_address {
                        ledger.entry(from).tokens_sent += value;
                    }
                    if let Some(to) = &record.to_address {
                        ledger.entry(to).tokens_received += value;
                    }
                }
                Some(TransactionType::Minting) => {
                    if let Some(to) = &record.to_address {
                        ledger.entry(to).tokens_minted += value;
                    }
                }
                Some(TransactionType::Burning) => {
                    if let Some(from) = &record.from_address {
                        ledger.entry(from).tokens_burned += value;
                    }
                }
                _ => {}
            }
        }

        ledger
    }

    fn entry(&mut self, address: &str) -> &mut LedgerEntry {
        let idx = match self.index.get(address) {
            Some(&idx) => idx,
            None => {
                self.rows.push(LedgerRow {
                    address: address.to_string(),
                    entry: LedgerEntry::default(),
                });
                let idx = self.rows.len() - 1;
                self.index.insert(address.to_string(), idx);
                idx
            }
        };
        &mut self.rows[idx].entry
    }

    pub fn get(&self, address: &str) -> Option<&LedgerEntry> {
        self.index.get(address).map(|&idx| &self.rows[idx].entry)
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self, metric: LedgerMetric) -> f64 {
        self.rows.iter().map(|r| r.entry.metric(metric)).sum()
    }

    /// Stable descending sort by `metric`; ties keep first-appearance order.
    pub fn top_by(&self, metric: LedgerMetric, n: usize) -> Vec<&LedgerRow> {
        let mut sorted: Vec<&LedgerRow> = self.rows.iter().collect();
        sorted.sort_by(|a, b| {
            b.entry
                .metric(metric)
                .partial_cmp(&a.entry.metric(metric))
                .unwrap_or(Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }

    pub fn top_by_holding(&self, n: usize) -> Vec<&LedgerRow> {
        self.top_by(LedgerMetric::Holding, n)
    }

    /// Top `n` holders with their share of total holding, sent and received.
    pub fn holder_summary(&self, n: usize) -> Vec<HolderSummary> {
        let total_holding = self.total(LedgerMetric::Holding);
        let total_sent = self.total(LedgerMetric::Sent);
        let total_received = self.total(LedgerMetric::Received);

        self.top_by_holding(n)
            .into_iter()
            .map(|row| {
                let e = &row.entry;
                HolderSummary {
                    address: row.address.clone(),
                    token_holding: e.token_holding(),
                    holding_share_pct: share_pct(e.token_holding(), total_holding),
                    tokens_sent: e.tokens_sent,
                    sent_share_pct: share_pct(e.tokens_sent, total_sent),
                    tokens_received: e.tokens_received,
                    received_share_pct: share_pct(e.tokens_received, total_received),
                }
            })
            .collect()
    }
}

fn share_pct(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

pub fn address_ledger(records: &[CanonicalRecord]) -> AddressLedger {
    AddressLedger::from_records(records)
}
