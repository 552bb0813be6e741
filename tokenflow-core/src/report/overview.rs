// report/overview.rs
// Headline metrics and top addresses

use super::base::Report;
use super::table::{fmt_amount, fmt_usd, TextTable};
use crate::config::AnalyticsSettings;
use tokenflow_common::analytics::{
    address_ledger, AddressLedger, AnalyticsResult, LedgerMetric, SummaryMetrics,
};
use tokenflow_common::data::CanonicalRecord;

pub struct OverviewReport;

impl OverviewReport {
    fn metrics_table(metrics: &SummaryMetrics) -> TextTable {
        let mut table = TextTable::new("Blockchain Summary Metrics", &["metric", "value"]);
        table.push_row(["Total Asset Supply".to_string(), fmt_amount(metrics.total_supply)]);
        table.push_row(["Unique Tokens".to_string(), metrics.unique_tokens.to_string()]);
        table.push_row([
            "Total Transactions".to_string(),
            metrics.total_transactions.to_string(),
        ]);
        table.push_row(["Tokens Minted".to_string(), fmt_amount(metrics.tokens_minted)]);
        table.push_row(["Tokens Burned".to_string(), fmt_amount(metrics.tokens_burned)]);
        table.push_row([
            "Tokens Transferred".to_string(),
            fmt_amount(metrics.tokens_transferred),
        ]);
        table.push_row([
            "Total Transaction Volume (USD)".to_string(),
            fmt_usd(metrics.total_usd_volume),
        ]);
        table
    }

    fn top_table(ledger: &AddressLedger, metric: LedgerMetric, title: &str, column: &str, n: usize) -> TextTable {
        let mut table = TextTable::new(title, &["address", column]);
        for row in ledger.top_by(metric, n) {
            table.push_row([row.address.clone(), fmt_amount(row.entry.metric(metric))]);
        }
        table
    }
}

impl Report for OverviewReport {
    fn name(&self) -> &str {
        "Blockchain Summary"
    }

    fn render(
        &self,
        records: &[CanonicalRecord],
        settings: &AnalyticsSettings,
    ) -> AnalyticsResult<String> {
        let n = settings.top_n;
        let metrics = SummaryMetrics::compute(records);
        let ledger = address_ledger(records);

        let sections = [
            Self::metrics_table(&metrics),
            Self::top_table(
                &ledger,
                LedgerMetric::Holding,
                &format!("Top {} Addresses Holding the Most Tokens", n),
                "token_holding",
                n,
            ),
            Self::top_table(
                &ledger,
                LedgerMetric::Sent,
                &format!("Top {} Addresses by Tokens Sent", n),
                "tokens_sent",
                n,
            ),
            Self::top_table(
                &ledger,
                LedgerMetric::Received,
                &format!("Top {} Addresses by Tokens Received", n),
                "tokens_received",
                n,
            ),
        ];

        Ok(sections
            .iter()
            .map(TextTable::render)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
