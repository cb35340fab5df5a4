use anyhow::{bail, Context, Result};
use clap::Parser;
use evotrade::config::ConfigManager;
use evotrade::data::{Checkpoint, CsvConnector, CsvMarketData, MarketDataSource};
use evotrade::engines::generation::{LogProgressCallback, Population, PopulationConfig};
use evotrade::engines::predictor::DenseNetworkBuilder;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolve trading agents on an event feed")]
struct Args {
    /// TOML or JSON configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Event feed CSV with `asset` and `magnitude` columns
    #[arg(long)]
    events: PathBuf,
    /// Price CSV with a `price` column, one row per asset
    #[arg(long)]
    prices: PathBuf,
    /// Seed the population from a saved agent instead of random genesis
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut manager = ConfigManager::new();
    if let Some(path) = &args.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
    }
    let config = manager.get().clone();

    let events = CsvConnector::load_events(&args.events)
        .with_context(|| format!("failed to load events {}", args.events.display()))?;
    let market = CsvMarketData::new(args.prices.clone());
    let prices = market
        .starting_prices()
        .with_context(|| format!("failed to load prices {}", args.prices.display()))?;
    if events.is_empty() {
        bail!("event feed {} is empty", args.events.display());
    }

    let assets = prices.len();
    let builder = DenseNetworkBuilder::new(
        assets,
        &config.predictor.hidden_units,
        config.predictor.hidden_activation,
        config.trading.decoding.output_width(),
        config.predictor.output_activation,
    );

    let mut population_config = PopulationConfig::from_app(&config, assets);
    if args.resume.is_some() {
        population_config.big_bang = false;
    }
    let mut population = Population::new(population_config, builder, &market)?;

    if let Some(path) = &args.resume {
        let checkpoint = Checkpoint::load(path)
            .with_context(|| format!("failed to load checkpoint {}", path.display()))?;
        population.seed_from_checkpoint(&checkpoint)?;
    }

    log::info!(
        "Evolving {} agents over {} events on {} assets",
        config.evolution.population_size,
        events.len(),
        assets
    );

    population.evolve_until_with(
        &events,
        &prices,
        &config.seasons,
        config.evolution.generations,
        &mut LogProgressCallback,
    )?;

    let summary = population.validate(&events, &prices)?;
    log::info!(
        "Finished after {} generations. Best score on the full feed: {:.5}%",
        population.generation_number() - 1,
        summary.best_score
    );

    Ok(())
}
