//! Batch driver: configuration sheet + observations in, report out.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use common::Result;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "forecast-engine")]
#[command(about = "Pick the best statistical model per series and forecast", long_about = None)]
struct Cli {
    /// Configuration CSV with `Parameters,Values` columns
    #[arg(short, long)]
    config: PathBuf,

    /// Observations (CSV or Parquet) with unique_id, ds, y columns
    #[arg(short, long)]
    input: PathBuf,

    /// Report destination: a `.json` file or a directory for CSV sections
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Worker threads (overrides the configuration; 0 = one per CPU)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Prediction interval level in percent (overrides the configuration)
    #[arg(short, long)]
    level: Option<u8>,
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = dataset::read_config(&cli.config)?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.level.is_some() {
        config.prediction_level = cli.level;
    }

    let observations = dataset::read_observations(&cli.input)?;
    let outcome = predictor::run(&config, &observations)?;
    let format = dataset::write_report(&cli.output, &outcome.final_data, &outcome.evaluation)?;

    info!(
        report = ?format,
        failures = outcome.failures.len(),
        excluded = outcome.excluded.len(),
        "Done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Forecasting run aborted");
            ExitCode::from(if e.is_config() { 2 } else { 1 })
        }
    }
}
