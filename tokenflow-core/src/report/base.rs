use crate::config::AnalyticsSettings;
use tokenflow_common::analytics::AnalyticsResult;
use tokenflow_common::data::CanonicalRecord;

pub trait Report: Send + Sync {
    fn name(&self) -> &str;

    /// Render every section over `records` (already filtered).
    fn render(
        &self,
        records: &[CanonicalRecord],
        settings: &AnalyticsSettings,
    ) -> AnalyticsResult<String>;
}
