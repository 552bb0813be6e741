// report/distribution.rs
// Holder distribution and activity trends

use super::base::Report;
use super::table::{fmt_amount, fmt_pct, TextTable};
use crate::config::AnalyticsSettings;
use tokenflow_common::analytics::{
    address_ledger, cumulative_supply, mint_burn_activity, time_series, top_n, top_n_by_count,
    AnalyticsResult, Granularity, SortOrder,
};
use tokenflow_common::data::{CanonicalRecord, GroupField, NumericField, RecordFilter, TransactionType};

pub struct DistributionReport;

fn volume_table(records: &[CanonicalRecord], granularity: Granularity, title: &str) -> TextTable {
    let mut table = TextTable::new(title, &[granularity.as_str(), "token", "volume"]);
    for point in time_series(records, granularity, NumericField::NormalizedValue) {
        table.push_row([
            point.bucket_start.to_string(),
            point.token_symbol,
            fmt_amount(point.value),
        ]);
    }
    table
}

impl Report for DistributionReport {
    fn name(&self) -> &str {
        "Token Distribution & Trends"
    }

    fn render(
        &self,
        records: &[CanonicalRecord],
        settings: &AnalyticsSettings,
    ) -> AnalyticsResult<String> {
        let n = settings.top_n;
        let transfers = RecordFilter::new()
            .transaction_type(TransactionType::Transfer.as_str())
            .apply(records);
        let mut sections: Vec<TextTable> = Vec::new();

        let mut holders = TextTable::new(
            "Top Token Holders and Distribution Summary",
            &[
                "address",
                "Token Holding",
                "% of Total Holding",
                "Tokens Sent",
                "% of Total Sent",
                "Tokens Received",
                "% of Total Received",
            ],
        );
        for h in address_ledger(records).holder_summary(n) {
            holders.push_row([
                h.address,
                fmt_amount(h.token_holding),
                fmt_pct(h.holding_share_pct),
                fmt_amount(h.tokens_sent),
                fmt_pct(h.sent_share_pct),
                fmt_amount(h.tokens_received),
                fmt_pct(h.received_share_pct),
            ]);
        }
        sections.push(holders);

        sections.push(volume_table(&transfers, Granularity::Day, "Daily Token Transfer Volume"));

        let mut supply = TextTable::new(
            format!("Cumulative Token Supply ({})", settings.supply_definition.as_str()),
            &["date", "token", "daily_net", "cumulative_supply"],
        );
        for p in cumulative_supply(records, settings.supply_definition) {
            supply.push_row([
                p.date.to_string(),
                p.token_symbol,
                fmt_amount(p.daily_net),
                fmt_amount(p.cumulative),
            ]);
        }
        sections.push(supply);

        let mut top = TextTable::new("Most Transferred Tokens", &["token", "total_transferred"]);
        for g in top_n(
            &transfers,
            GroupField::TokenSymbol,
            NumericField::NormalizedValue,
            n,
            SortOrder::Descending,
        ) {
            top.push_row([g.key, fmt_amount(g.value)]);
        }
        sections.push(top);

        sections.push(volume_table(&transfers, Granularity::Week, "Weekly Aggregated Volume"));
        sections.push(volume_table(&transfers, Granularity::Month, "Monthly Aggregated Volume"));

        let mut spikes = TextTable::new(
            "Spike Detection in Minting & Burning",
            &["date", "token", "token_minting", "token_burning"],
        );
        for a in mint_burn_activity(records).into_iter().take(n) {
            spikes.push_row([
                a.date.to_string(),
                a.token_symbol,
                fmt_amount(a.minted),
                fmt_amount(a.burned),
            ]);
        }
        sections.push(spikes);

        let mut active = TextTable::new(
            "Most Actively Traded Tokens by Count",
            &["token", "transaction_count"],
        );
        for g in top_n_by_count(&transfers, GroupField::TokenSymbol, n, SortOrder::Descending) {
            active.push_row([g.key, format!("{}", g.value as u64)]);
        }
        sections.push(active);

        Ok(sections
            .iter()
            .map(TextTable::render)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
