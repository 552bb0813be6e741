// tokenflow-core/tests/dashboard_flow.rs
// Explorer pages through cache, pipeline and report presets

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokenflow_core::config::AnalyticsSettings;
use tokenflow_core::data::{NormalizerConfig, RecordFilter};
use tokenflow_core::report::{create_report, list_reports};
use tokenflow_core::service::Pipeline;
use tokenflow_core::source::{CachedSource, ExplorerSource, PageFetcher, SourceError};

/// Two pages of items, the second overlapping the first, then an empty page.
struct TwoPages {
    requests: AtomicU32,
}

fn transfer(hash: &str, symbol: &str, value: &str, from: &str, to: &str, kind: &str) -> Value {
    json!({
        "transaction_hash": hash,
        "timestamp": "2024-07-01T12:00:00.000000Z",
        "type": kind,
        "token": { "symbol": symbol, "decimals": "18", "exchange_rate": "2.0" },
        "total": { "value": value },
        "from": { "hash": from },
        "to": { "hash": to },
        "method": "transfer"
    })
}

#[async_trait]
impl PageFetcher for TwoPages {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Value>, SourceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(match page {
            1 => vec![
                transfer("0x1", "XCAP", "5000000000000000000", "0x0", "0xaaa", "token_minting"),
                transfer("0x2", "XCAP", "2000000000000000000", "0xaaa", "0xbbb", "token_transfer"),
            ],
            2 => vec![
                transfer("0x2", "XCAP", "2000000000000000000", "0xaaa", "0xbbb", "token_transfer"),
                transfer("0x3", "XCAP", "1000000000000000000", "0xbbb", "0x0", "token_burning"),
            ],
            _ => Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_fetch_normalize_report_and_export() {
    let explorer = ExplorerSource::new(
        TwoPages { requests: AtomicU32::new(0) },
        "http://explorer.test/api/v2/token-transfers",
        50,
        Duration::ZERO,
    );
    let source = CachedSource::new(explorer, Duration::from_secs(60));
    let pipeline = Pipeline::new(NormalizerConfig::live());

    let output = pipeline.run(&source, &RecordFilter::new()).await;
    assert!(!output.is_partial());
    assert_eq!(output.raw_count, 4);
    assert_eq!(output.records.len(), 3);
    assert_eq!(output.records[0].normalized_value, 5.0);
    assert_eq!(output.records[0].usd_value, 10.0);

    // second run is served from the cache
    let again = pipeline.run(&source, &RecordFilter::new()).await;
    assert_eq!(again.records, output.records);
    assert_eq!(requests(&source), 3);

    let overview = create_report("overview")
        .unwrap()
        .render(&output.view, &AnalyticsSettings::default())
        .unwrap();
    assert!(overview.contains("4.000000"));

    for info in list_reports() {
        let rendered = create_report(&info.id)
            .unwrap()
            .render(&output.view, &AnalyticsSettings::default())
            .unwrap();
        assert!(!rendered.is_empty());
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filtered_token_data.csv");
    assert_eq!(output.export_view(&path).unwrap(), 3);
}

fn requests(source: &CachedSource<ExplorerSource<TwoPages>>) -> u32 {
    source.inner().fetcher().requests.load(Ordering::SeqCst)
}
