// tokenflow-core/src/bin/dashboard/main.rs
// Token transfer dashboard: acquire -> normalize -> filter -> report

mod modules;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use modules::cli::{Cli, Commands, ViewArgs};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tokenflow_core::config::Settings;
use tokenflow_core::report::{create_report, list_reports};
use tokenflow_core::service::Pipeline;
use tokenflow_core::source::{CachedSource, ExplorerSource, RecordSource, WorkbookSource};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::from_path(path),
        None => Settings::new(),
    }
    .context("Failed to load settings")?;

    match cli.command {
        Commands::Reports => {
            for info in list_reports() {
                println!("{:<14}{}\n{:<14}{}", info.id, info.name, "", info.description);
            }
        }

        Commands::Sheets { workbook, limit } => {
            if let Some(path) = workbook {
                settings.source.workbook_path = path.display().to_string();
            }
            let source = WorkbookSource::from_settings(&settings.source);
            let snapshot = source
                .read_snapshot()
                .with_context(|| format!("Failed to read {}", source.path().display()))?;
            println!("{}", modules::sheets::render_snapshot(&snapshot, limit));
        }

        Commands::Fetch { max_pages, view } => {
            if let Some(pages) = max_pages {
                settings.source.max_pages = pages;
                settings.validate()?;
            }
            let explorer = ExplorerSource::from_settings(&settings.source)
                .context("Failed to build explorer client")?;
            let source = CachedSource::new(explorer, settings.cache.ttl());
            run_view(&source, &view, &settings).await?;
        }

        Commands::Load { workbook, sheet, view } => {
            if let Some(path) = workbook {
                settings.source.workbook_path = path.display().to_string();
            }
            if let Some(sheet) = sheet {
                settings.source.records_sheet = sheet;
            }
            let source = WorkbookSource::from_settings(&settings.source);
            run_view(&source, &view, &settings).await?;
        }
    }

    Ok(())
}

async fn run_view(source: &dyn RecordSource, view: &ViewArgs, settings: &Settings) -> Result<()> {
    // Resolve the preset before touching the network
    let report = create_report(&view.report)?;
    let filter = view.to_filter()?;

    let pipeline = Pipeline::new(settings.normalize.normalizer_config());
    let output = pipeline.run(source, &filter).await;
    if output.is_partial() {
        warn!(
            "Source terminated early; continuing with {} records",
            output.records.len()
        );
    }

    let rendered = output
        .render(report.as_ref(), &settings.analytics)
        .context("Failed to compute report")?;
    println!("{}", rendered);

    if let Some(path) = &view.export {
        let rows = output
            .export_view(path)
            .with_context(|| format!("Failed to export to {}", path.display()))?;
        info!("Exported {} records to {}", rows, path.display());
    }

    Ok(())
}
