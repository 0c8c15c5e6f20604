use std::path::PathBuf;

use clap::Parser;
use county_series::config::Config;
use county_series::pages::{
    CollisionPolicy, PageAggregator, PageRun, ReferenceMaps, ScrapeSelectors,
};
use county_series::report::{Outcome, RunStatus};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "aggregate-pages")]
#[command(about = "Fold scraped statistics pages into one nested JSON index", long_about = None)]
struct Cli {
    /// Directory of pages named <state>-<datatype>-<year>-<period>.<ext>
    #[arg(long, default_value = "data/pages")]
    pages: PathBuf,

    /// Reference JSON with states, datatypes and periods code maps
    #[arg(long, default_value = "data/reference.json")]
    reference: PathBuf,

    /// Output JSON file
    #[arg(long, default_value = "result.json")]
    output: PathBuf,

    /// Collision policy: last-write-wins, first-write-wins or error
    #[arg(long, env = "COLLISION_POLICY")]
    collision_policy: Option<CollisionPolicy>,

    /// Leading header cells that are not entity names
    #[arg(long, env = "HEADER_SKIP")]
    header_skip: Option<usize>,
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
    if let Some(policy) = cli.collision_policy {
        config.collision_policy = policy;
    }
    if let Some(header_skip) = cli.header_skip {
        config.header_skip = header_skip;
    }
    info!("Aggregating pages in {:?} with config: {:?}", cli.pages, config);

    let maps = ReferenceMaps::from_json_file(&cli.reference)?;
    info!(
        "Loaded reference maps: {} states, {} datatypes, {} periods",
        maps.states.len(),
        maps.datatypes.len(),
        maps.periods.len()
    );

    let selectors = ScrapeSelectors {
        header_skip: config.header_skip,
        ..ScrapeSelectors::default()
    };
    let aggregator = PageAggregator::new(maps, &selectors)?;

    let pages = PageAggregator::list_pages(&cli.pages)?;
    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut run = PageRun::new(config.collision_policy);
    for path in &pages {
        aggregator.process_file(&mut run, path);
        pb.inc(1);
    }
    pb.finish_with_message(format!("✓ Processed {} pages", pages.len()));

    run.report.log_summary("Page run");
    if run.report.count(Outcome::ReferenceLookupError) > 0 {
        error!(
            "{} pages had codes missing from {:?}",
            run.report.count(Outcome::ReferenceLookupError),
            cli.reference
        );
    }

    run.index.write_json_file(&cli.output)?;
    info!(
        "Saved {} values to {}",
        run.index.value_count(),
        cli.output.display()
    );

    if run.report.status() == RunStatus::Failed {
        return Err(format!("No page in {:?} produced data", cli.pages).into());
    }
    Ok(())
}
