// Precomputed workbook sheets as text tables

use tokenflow_core::report::table::{fmt_amount, fmt_pct, TextTable};
use tokenflow_core::source::workbook::{sheets, WorkbookSnapshot};

pub fn render_snapshot(snapshot: &WorkbookSnapshot, limit: usize) -> String {
    let mut holders = TextTable::new(
        sheets::HOLDER_SUMMARY,
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
    for row in snapshot.holders.iter().take(limit) {
        holders.push_row([
            row.address.clone(),
            fmt_amount(row.token_holding),
            fmt_pct(row.holding_share_pct),
            fmt_amount(row.tokens_sent),
            fmt_pct(row.sent_share_pct),
            fmt_amount(row.tokens_received),
            fmt_pct(row.received_share_pct),
        ]);
    }

    let mut volume = TextTable::new(sheets::VOLUME_PER_DAY, &["date", "token", "daily_volume"]);
    for row in snapshot.volume_per_day.iter().take(limit) {
        volume.push_row([row.date.clone(), row.token.clone(), fmt_amount(row.daily_volume)]);
    }

    let mut supply = TextTable::new(
        sheets::CUMULATIVE_SUPPLY,
        &["date", "token.symbol", "cumulative_supply"],
    );
    for row in snapshot.cumulative_supply.iter().take(limit) {
        supply.push_row([
            row.date.clone(),
            row.token_symbol.clone(),
            fmt_amount(row.cumulative_supply),
        ]);
    }

    let mut top = TextTable::new(sheets::TOP_TOKENS, &["token.symbol", "total_transferred"]);
    for row in snapshot.top_tokens.iter().take(limit) {
        top.push_row([row.token_symbol.clone(), fmt_amount(row.total_transferred)]);
    }

    [holders, volume, supply, top]
        .iter()
        .map(TextTable::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenflow_core::source::workbook::TopTokenRow;

    #[test]
    fn test_limit_applies_per_sheet() {
        let snapshot = WorkbookSnapshot {
            top_tokens: vec![
                TopTokenRow { token_symbol: "XCAP".into(), total_transferred: 10.0 },
                TopTokenRow { token_symbol: "USDX".into(), total_transferred: 5.0 },
            ],
            ..WorkbookSnapshot::default()
        };
        let out = render_snapshot(&snapshot, 1);
        assert!(out.contains("XCAP"));
        assert!(!out.contains("USDX"));
        assert_eq!(out.matches("(no rows)").count(), 3);
    }
}
