pub mod errors;
pub mod ledger;
pub mod pivot;
pub mod ranking;
pub mod series;
pub mod stats;
pub mod summary;

pub use errors::{AnalyticsError, AnalyticsResult};
pub use ledger::{address_ledger, AddressLedger, HolderSummary, LedgerEntry, LedgerMetric, LedgerRow};
pub use pivot::{pivot, AggFunc, PivotTable};
pub use ranking::{top_n, top_n_by_count, top_records, RankedGroup, SortOrder};
pub use series::{
    cumulative_supply, rolling_average, rolling_average_by_token, time_series,
    CumulativeSupplyPoint, Granularity, RollingPoint, SupplyDefinition, TimeSeriesPoint,
};
pub use stats::{
    anomalies, histogram, percentile, percentile_threshold, AnomalySet, HistogramBin,
    DEFAULT_PERCENTILE,
};
pub use summary::{mint_burn_activity, MintBurnActivity, SummaryMetrics};
