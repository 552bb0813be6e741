// tokenflow-core/src/bin/dashboard/modules/cli.rs
// Command line surface and its translation into a RecordFilter

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokenflow_core::data::{NumericField, RecordFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Token transfer analytics dashboard")]
pub struct Cli {
    /// Settings file (defaults to ./config.{toml,json,yaml} when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through the explorer API and render a report
    Fetch {
        /// Overrides source.max_pages
        #[arg(long)]
        max_pages: Option<u32>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Read the cleaned-records sheet of a workbook and render a report
    Load {
        /// Overrides source.workbook_path
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// Overrides source.records_sheet
        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the precomputed summary sheets of a workbook
    Sheets {
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// Rows shown per sheet
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// List the available report presets
    Reports,
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Token symbol, or "All"
    #[arg(long, default_value = "All")]
    pub token: String,

    /// Transaction type (token_transfer, token_minting, token_burning), or "All"
    #[arg(long = "type", default_value = "All")]
    pub kind: String,

    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Numeric field bounded by --min/--max
    #[arg(long, default_value = "exchange_rate")]
    pub field: String,

    #[arg(long)]
    pub min: Option<f64>,

    #[arg(long)]
    pub max: Option<f64>,

    /// Report preset, see `dashboard reports`
    #[arg(short, long, default_value = "overview")]
    pub report: String,

    /// Write the filtered records to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl ViewArgs {
    pub fn to_filter(&self) -> Result<RecordFilter> {
        let mut filter = RecordFilter::new()
            .token(self.token.as_str())
            .transaction_type(self.kind.as_str());

        if self.from.is_some() || self.to.is_some() {
            let start = self.from.unwrap_or(NaiveDate::MIN);
            let end = self.to.unwrap_or(NaiveDate::MAX);
            if start > end {
                bail!("--from {} is after --to {}", start, end);
            }
            filter = filter.between_dates(start, end);
        }

        if self.min.is_some() || self.max.is_some() {
            let field: NumericField = self.field.parse()?;
            let min = self.min.unwrap_or(f64::NEG_INFINITY);
            let max = self.max.unwrap_or(f64::INFINITY);
            if min > max {
                bail!("--min {} is greater than --max {}", min, max);
            }
            filter = filter.in_range(field, min, max);
        }

        Ok(filter)
    }
}
