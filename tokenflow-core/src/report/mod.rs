pub(crate) mod base;
mod distribution;
mod insights;
mod overview;
pub mod table;

use crate::service::ServiceError;
pub use base::Report;
use distribution::DistributionReport;
use insights::InsightsReport;
use overview::OverviewReport;

#[derive(Debug, Clone)]
pub struct ReportInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

pub fn create_report(report_id: &str) -> Result<Box<dyn Report>, ServiceError> {
    match report_id {
        "overview" => Ok(Box::new(OverviewReport)),
        "distribution" => Ok(Box::new(DistributionReport)),
        "insights" => Ok(Box::new(InsightsReport)),
        _ => Err(ServiceError::UnknownReport(report_id.to_string())),
    }
}

pub fn list_reports() -> Vec<ReportInfo> {
    vec![
        ReportInfo {
            id: "overview".to_string(),
            name: "Blockchain Summary".to_string(),
            description: "Supply and volume metrics plus the top holders, senders and receivers"
                .to_string(),
        },
        ReportInfo {
            id: "distribution".to_string(),
            name: "Token Distribution & Trends".to_string(),
            description: "Holder shares, daily, weekly and monthly volume, cumulative supply and mint/burn spikes"
                .to_string(),
        },
        ReportInfo {
            id: "insights".to_string(),
            name: "Advanced Token Analytics".to_string(),
            description: "USD distribution, utilization pivot, hourly heatmap, rolling volume and anomalies"
                .to_string(),
        },
    ]
}

pub fn get_report_info(report_id: &str) -> Option<ReportInfo> {
    list_reports().into_iter().find(|info| info.id == report_id)
}
