//! goldcast - daily gold direction forecaster
//!
//! Downloads (or reads) daily XAU/USD bars, builds technical features,
//! evaluates candidate classifiers walk-forward per horizon, stores the best
//! one and prints the probability of an up move. Charts of the close trend
//! and of the daily return distribution land in the output directory.
//!
//! # Usage
//! ```sh
//! goldcast run --config config/settings.toml
//! goldcast predict --horizon 5 --input data/raw/prices.csv
//! ```
//!
//! # Environment Variables
//! - `GOLDCAST_CONFIG` - Settings file (default: config/settings.toml)
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use goldcast::application::features::build_features;
use goldcast::application::pipeline::{predict_latest, run_horizon};
use goldcast::config::Settings;
use goldcast::domain::market::price_bar::PriceBar;
use goldcast::domain::ml::Prediction;
use goldcast::domain::ports::PriceSource;
use goldcast::infrastructure::persistence::{write_dataset, write_price_bars};
use goldcast::infrastructure::visualization::{plot_close_trend, plot_return_distribution};
use goldcast::infrastructure::{CsvPriceSource, JsonArtifactStore, StooqClient};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Daily gold direction forecaster", long_about = None)]
struct Cli {
    /// Settings file (overrides GOLDCAST_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch data, train every configured horizon and predict
    Run {
        /// Price CSV to use instead of downloading
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Score the latest bar with a stored model
    Predict {
        /// Forecast horizon in trading days
        #[arg(long)]
        horizon: usize,

        /// Price CSV to use instead of downloading
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };
    info!(
        "goldcast {}: horizons {:?}, {} days",
        env!("CARGO_PKG_VERSION"),
        settings.project.horizons,
        settings.project.data_days
    );

    match cli.command {
        Commands::Run { input } => run(&settings, input).await,
        Commands::Predict { horizon, input } => predict(&settings, horizon, input).await,
    }
}

fn price_source(settings: &Settings, input: Option<PathBuf>) -> Box<dyn PriceSource> {
    match input.or_else(|| settings.data_source.csv_path.clone()) {
        Some(path) => Box::new(CsvPriceSource::new(path)),
        None => Box::new(StooqClient::new(
            &settings.data_source,
            settings.project.data_days,
        )),
    }
}

async fn load_bars(settings: &Settings, input: Option<PathBuf>) -> Result<Vec<PriceBar>> {
    let source = price_source(settings, input);
    let bars = source
        .fetch_bars()
        .await
        .with_context(|| format!("Failed to load bars from {}", source.name()))?;
    if bars.is_empty() {
        bail!("{} returned no price bars", source.name());
    }
    Ok(bars)
}

async fn run(settings: &Settings, input: Option<PathBuf>) -> Result<()> {
    let bars = load_bars(settings, input).await?;
    write_price_bars(&settings.storage.raw_csv, &bars)?;

    let table = build_features(&bars, &settings.features)?;

    let mut predictions = Vec::with_capacity(settings.project.horizons.len());
    for &horizon in &settings.project.horizons {
        let store = JsonArtifactStore::new(settings.storage.horizon_dir(horizon));
        let outcome = run_horizon(&table, horizon, &settings.model, &store)
            .with_context(|| format!("Horizon {} failed", horizon))?;
        write_dataset(&settings.storage.processed_csv_for(horizon), &outcome.dataset)?;

        println!(
            "horizon {:>3}: best {:<14} folds {:>3}  P(up) {:.3}  P(down) {:.3}",
            horizon,
            outcome.metadata.best_model,
            outcome.metadata.folds_evaluated,
            outcome.prediction.probability_up,
            outcome.prediction.probability_down
        );
        predictions.push(outcome.prediction);
    }

    plot_close_trend(&table, &settings.output.output_dir)?;
    plot_return_distribution(&table, &settings.output.output_dir)?;
    write_predictions(&settings.output.output_dir, &predictions)
}

async fn predict(settings: &Settings, horizon: usize, input: Option<PathBuf>) -> Result<()> {
    let bars = load_bars(settings, input).await?;
    let table = build_features(&bars, &settings.features)?;

    let store = JsonArtifactStore::new(settings.storage.horizon_dir(horizon));
    let prediction = predict_latest(&table, &store)
        .with_context(|| format!("No usable model for horizon {}", horizon))?;

    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

fn write_predictions(output_dir: &Path, predictions: &[Prediction]) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    let path = output_dir.join("predictions.json");
    let content = serde_json::to_string_pretty(predictions)?;
    fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {} predictions to {:?}", predictions.len(), path);
    Ok(())
}
