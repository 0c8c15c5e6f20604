use std::path::PathBuf;

use clap::Parser;
use county_series::config::Config;
use county_series::report::RunStatus;
use county_series::workbook::WorkbookAggregator;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "aggregate-workbook")]
#[command(about = "Aggregate per-county workbook tables into one wide CSV", long_about = None)]
struct Cli {
    /// Path to the source workbook (.xlsx, .xls, .ods)
    file: PathBuf,

    /// Measure-type label that marks qualifying sheets (e.g. "unemployment rate")
    #[arg(long)]
    measure: String,

    /// Directory for the aggregated CSV
    #[arg(long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Substring that marks entity rows
    #[arg(long, env = "ENTITY_MARKER")]
    entity_marker: Option<String>,

    /// Case-insensitive substring of entity names to leave out (empty keeps all)
    #[arg(long, env = "EXCLUSION_TOKEN")]
    exclude: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,county_series=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(marker) = cli.entity_marker {
        config.entity_marker = marker;
    }
    if let Some(exclude) = cli.exclude {
        config.exclusion_token = exclude;
    }
    info!("Aggregating {:?} with config: {:?}", cli.file, config);

    if !cli.file.exists() {
        error!("File not found: {:?}", cli.file);
        return Err(format!("File not found: {:?}", cli.file).into());
    }

    let aggregator = WorkbookAggregator::new(&cli.measure, &config);
    let run = aggregator.aggregate_file(&cli.file)?;
    run.report.log_summary("Workbook run");

    if run.report.status() == RunStatus::Failed {
        return Err(format!(
            "No entity tables extracted for '{}' from {:?}",
            cli.measure, cli.file
        )
        .into());
    }

    let path = run.write_csv(&config.output_dir, &cli.file, &cli.measure)?;
    info!(
        "Wrote {} rows x {} entities to {}",
        run.table.row_count(),
        run.table.entity_count(),
        path.display()
    );
    Ok(())
}
