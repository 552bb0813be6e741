// report/insights.rs
// USD distribution, utilization, hourly activity, rolling volume, anomalies

use super::base::Report;
use super::table::{fmt_amount, fmt_opt, fmt_text, fmt_time, fmt_usd, TextTable};
use crate::config::AnalyticsSettings;
use tokenflow_common::analytics::{
    anomalies, histogram, pivot, rolling_average_by_token, time_series, top_n, top_records,
    AggFunc, AnalyticsResult, Granularity, PivotTable, SortOrder,
};
use tokenflow_common::data::{CanonicalRecord, GroupField, NumericField};

pub struct InsightsReport;

/// One row per pivot row key, one column per observed column key.
fn pivot_table(title: &str, corner: &str, table: &PivotTable, counts: bool) -> TextTable {
    let columns: Vec<&str> = table.columns().collect();
    let mut headers = vec![corner];
    headers.extend(columns.iter().copied());

    let mut out = TextTable::new(title, &headers);
    for key in table.row_keys() {
        let mut cells = vec![key.to_string()];
        for col in &columns {
            let v = table.get(key, col);
            cells.push(if counts {
                format!("{}", v as u64)
            } else {
                fmt_amount(v)
            });
        }
        out.push_row(cells);
    }
    out
}

impl Report for InsightsReport {
    fn name(&self) -> &str {
        "Advanced Token Analytics"
    }

    fn render(
        &self,
        records: &[CanonicalRecord],
        settings: &AnalyticsSettings,
    ) -> AnalyticsResult<String> {
        let n = settings.top_n;
        let mut sections: Vec<TextTable> = Vec::new();

        let mut dist = TextTable::new(
            format!("USD Value Distribution ({} bins, non-empty shown)", settings.histogram_bins),
            &["lower", "upper", "count"],
        );
        for bin in histogram(records, NumericField::UsdValue, settings.histogram_bins)? {
            if bin.count > 0 {
                dist.push_row([fmt_usd(bin.lower), fmt_usd(bin.upper), bin.count.to_string()]);
            }
        }
        sections.push(dist);

        let mut top_usd = TextTable::new(
            format!("Top {} Transfers by USD Value", n),
            &["timestamp", "token", "usd_value"],
        );
        for r in top_records(records, NumericField::UsdValue, n) {
            top_usd.push_row([
                fmt_time(r.timestamp),
                fmt_text(r.token_symbol.as_deref()),
                fmt_usd(r.usd_value),
            ]);
        }
        sections.push(top_usd);

        let utilization = pivot(
            records,
            GroupField::TokenSymbol,
            GroupField::TransactionType,
            NumericField::NormalizedValue,
            AggFunc::Sum,
        );
        sections.push(pivot_table(
            "Token Utilization Pattern",
            "token",
            &utilization,
            false,
        ));

        let mut by_usd = TextTable::new("Top Tokens by USD Value", &["token", "usd_value"]);
        for g in top_n(
            records,
            GroupField::TokenSymbol,
            NumericField::UsdValue,
            n,
            SortOrder::Descending,
        ) {
            by_usd.push_row([g.key, fmt_usd(g.value)]);
        }
        sections.push(by_usd);

        let heatmap = pivot(
            records,
            GroupField::TokenSymbol,
            GroupField::Hour,
            NumericField::NormalizedValue,
            AggFunc::Count,
        );
        sections.push(pivot_table("Hourly Transfer Heatmap", "token", &heatmap, true));

        let daily = time_series(records, Granularity::Day, NumericField::NormalizedValue);
        let rolling = rolling_average_by_token(
            &daily,
            settings.rolling_window,
            settings.rolling_min_periods,
        )?;
        let mut trend = TextTable::new(
            format!("{}-Day Rolling Average Volume", settings.rolling_window),
            &["date", "token", "volume", "rolling_avg"],
        );
        for p in rolling {
            trend.push_row([
                p.bucket_start.to_string(),
                p.token_symbol,
                fmt_amount(p.value),
                fmt_opt(p.rolling_average),
            ]);
        }
        sections.push(trend);

        let spikes = anomalies(records, NumericField::NormalizedValue, settings.percentile)?;
        let mut anomaly = TextTable::new(
            format!(
                "High-Value Transfers above the {} quantile ({})",
                settings.percentile,
                fmt_opt(spikes.threshold)
            ),
            &["timestamp", "token", "type", "normalized_value", "usd_value"],
        );
        for r in &spikes.records {
            anomaly.push_row([
                fmt_time(r.timestamp),
                fmt_text(r.token_symbol.as_deref()),
                fmt_text(r.transaction_type.as_ref().map(|t| t.as_str())),
                fmt_amount(r.normalized_value),
                fmt_usd(r.usd_value),
            ]);
        }
        sections.push(anomaly);

        Ok(sections
            .iter()
            .map(TextTable::render)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
