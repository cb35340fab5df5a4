use super::{
    progress::{GenerationReport, LogProgressCallback, ProgressCallback},
    selection::{normalize_scores, FitnessWheel, ZeroFitnessPolicy},
};
use crate::{
    config::{AppConfig, SeasonConfig},
    data::{checkpoint::Checkpoint, seasons::split_seasons, source::MarketDataSource},
    engines::evaluation::{check_prices, Agent, DecodingMode, WalletParams},
    engines::predictor::{MutationPolicy, Predictor, PredictorBuilder, PredictorSnapshot},
    error::{EvotradeError, Result},
    types::Event,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PopulationConfig {
    pub population_size: usize,
    pub mutation: MutationPolicy,
    pub starting_cash: Vec<f64>,
    pub trading_fee: f64,
    pub decoding: DecodingMode,
    pub zero_fitness_policy: ZeroFitnessPolicy,
    pub checkpoint_path: Option<PathBuf>,
    pub dump_trades: Option<PathBuf>,
    pub seed: Option<u64>,
    /// Build a random population at construction time
    pub big_bang: bool,
}

impl PopulationConfig {
    pub fn from_app(config: &AppConfig, assets: usize) -> Self {
        Self {
            population_size: config.evolution.population_size,
            mutation: MutationPolicy::new(
                config.evolution.mutation_rate,
                config.evolution.mutation_scale,
            ),
            starting_cash: config.trading.starting_cash_for(assets),
            trading_fee: config.trading.trading_fee,
            decoding: config.trading.decoding,
            zero_fitness_policy: config.evolution.zero_fitness_policy,
            checkpoint_path: config.output.checkpoint_path.clone(),
            dump_trades: config.output.dump_trades.clone(),
            seed: config.evolution.seed,
            big_bang: config.evolution.big_bang,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(EvotradeError::Configuration(
                "population_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation.rate) {
            return Err(EvotradeError::Configuration(
                "mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if !self.mutation.scale.is_finite() || self.mutation.scale < 0.0 {
            return Err(EvotradeError::Configuration(
                "mutation scale must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of ranking one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub season: Option<usize>,
    pub mean_profit: f64,
    pub best_score: f64,
    pub worst_score: f64,
    pub best_agent_id: usize,
    /// Fitness of every agent, best first
    pub fitness: Vec<f64>,
    /// Raw scores in the same order as `fitness`
    pub scores: Vec<f64>,
}

pub struct Population<B: PredictorBuilder> {
    config: PopulationConfig,
    wallet: WalletParams,
    builder: B,
    agents: Vec<Agent<B::Output>>,
    generation_number: usize,
    rng: StdRng,
}

impl<B: PredictorBuilder> Population<B> {
    pub fn new(config: PopulationConfig, builder: B, market: &dyn MarketDataSource) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, builder, market, rng)
    }

    /// Construct with an explicit random source, ignoring `config.seed`.
    pub fn with_rng(
        config: PopulationConfig,
        builder: B,
        market: &dyn MarketDataSource,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let starting_price = market.starting_prices()?;
        if starting_price.len() != config.starting_cash.len() {
            return Err(EvotradeError::Configuration(format!(
                "starting_cash has {} assets but the market reports {} starting prices",
                config.starting_cash.len(),
                starting_price.len()
            )));
        }

        let wallet = WalletParams {
            starting_cash: config.starting_cash.clone(),
            starting_price,
            trading_fee: config.trading_fee,
        };
        // Surface wallet preconditions now rather than on the first agent
        wallet.new_wallet()?;

        let mut population = Self {
            config,
            wallet,
            builder,
            agents: Vec::new(),
            generation_number: 1,
            rng,
        };

        if population.config.big_bang {
            population.genesis()?;
        }

        Ok(population)
    }

    /// Replace the population with freshly built agents
    pub fn genesis(&mut self) -> Result<()> {
        let mut agents = Vec::with_capacity(self.config.population_size);
        for id in 0..self.config.population_size {
            agents.push(Agent::new(
                id,
                None,
                &self.builder,
                &self.wallet,
                &self.config.mutation,
                &mut self.rng,
            )?);
        }
        self.agents = agents;
        log::info!("Built {} agents", self.agents.len());
        Ok(())
    }

    /// Replace every agent with a mutated copy of a checkpointed predictor
    pub fn seed_from_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        self.seed_from_snapshot(&checkpoint.predictor)?;
        log::info!(
            "Seeded {} agents from generation {} agent {}",
            self.agents.len(),
            checkpoint.generation,
            checkpoint.agent_id
        );
        Ok(())
    }

    /// Replace every agent with a mutated copy of `snapshot`.
    ///
    /// The snapshot must read one input per asset and emit one row in the
    /// width the decoding mode expects.
    pub fn seed_from_snapshot(&mut self, snapshot: &PredictorSnapshot) -> Result<()> {
        let architecture = &snapshot.architecture;
        let assets = self.wallet.num_assets();
        let outputs = self.config.decoding.output_width();
        if architecture.input_width() != assets || architecture.output_width() != outputs {
            return Err(EvotradeError::Configuration(format!(
                "snapshot maps {} inputs to {} outputs, population needs {} to {}",
                architecture.input_width(),
                architecture.output_width(),
                assets,
                outputs
            )));
        }

        let mut agents = Vec::with_capacity(self.config.population_size);
        for id in 0..self.config.population_size {
            let predictor = self.builder.restore(snapshot)?;
            agents.push(Agent::new(
                id,
                Some(predictor),
                &self.builder,
                &self.wallet,
                &self.config.mutation,
                &mut self.rng,
            )?);
        }
        self.agents = agents;
        Ok(())
    }

    pub fn agents(&self) -> &[Agent<B::Output>] {
        &self.agents
    }

    pub fn best_agent(&self) -> Option<&Agent<B::Output>> {
        self.agents.first()
    }

    pub fn generation_number(&self) -> usize {
        self.generation_number
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn wallet_params(&self) -> &WalletParams {
        &self.wallet
    }

    fn check_feed(&self, events: &[Event], prices: &[f64]) -> Result<()> {
        if self.agents.is_empty() {
            return Err(EvotradeError::Configuration(
                "population has no agents; run genesis or seed it from a checkpoint".to_string(),
            ));
        }
        if prices.len() != self.wallet.num_assets() {
            return Err(EvotradeError::Configuration(format!(
                "price vector has {} entries but wallets track {} assets",
                prices.len(),
                self.wallet.num_assets()
            )));
        }
        check_prices(prices, "price")?;
        if let Some(event) = events.iter().find(|e| e.asset >= prices.len()) {
            return Err(EvotradeError::AssetIndex {
                index: event.asset,
                assets: prices.len(),
            });
        }
        Ok(())
    }

    /// Evaluate every agent on the batch. Agents have no shared state, so
    /// this fans out across the rayon pool; failures are isolated per agent.
    pub fn batch_feed_inputs<C: ProgressCallback>(
        &mut self,
        events: &[Event],
        prices: &[f64],
        callback: &mut C,
    ) -> Result<()> {
        self.check_feed(events, prices)?;

        let mode = self.config.decoding;
        let failed = self
            .agents
            .par_iter_mut()
            .map(|agent| agent.evaluate(events, prices, mode))
            .filter(|ok| !ok)
            .count();

        callback.on_agents_evaluated(failed, self.agents.len());
        Ok(())
    }

    /// Mean earnings over every agent and every asset, valued at `prices`.
    pub fn report_profits(&self, prices: &[f64]) -> Result<f64> {
        let mut total = 0.0;
        let mut count = 0usize;
        for agent in &self.agents {
            for (idx, price) in prices.iter().enumerate() {
                total += agent.wallet.earnings_at(idx, *price)?;
                count += 1;
            }
        }

        let mean = if count == 0 { 0.0 } else { total / count as f64 };
        log::info!("Mean profit: {:.5}%", mean);
        Ok(mean)
    }

    pub fn normalize_fitness(&mut self) {
        let scores: Vec<f64> = self.agents.iter().map(|a| a.score).collect();
        let fitness = normalize_scores(&scores);
        for (agent, f) in self.agents.iter_mut().zip(fitness) {
            agent.fitness = f;
        }
    }

    pub fn sort_by_decreasing_fitness(&mut self) {
        self.agents.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// One roulette-wheel draw over the current fitness values.
    ///
    /// Fails with `ZeroFitnessSum` when no agent has any fitness.
    pub fn pool_selection(&mut self) -> Result<usize> {
        let fitness: Vec<f64> = self.agents.iter().map(|a| a.fitness).collect();
        let wheel = FitnessWheel::new(&fitness, self.generation_number)?;
        Ok(wheel.spin(&mut self.rng))
    }

    fn select_parents(&mut self) -> Result<Vec<usize>> {
        let count = self.config.population_size;
        let fitness: Vec<f64> = self.agents.iter().map(|a| a.fitness).collect();

        match FitnessWheel::new(&fitness, self.generation_number) {
            Ok(wheel) => Ok((0..count).map(|_| wheel.spin(&mut self.rng)).collect()),
            Err(e @ EvotradeError::ZeroFitnessSum { .. }) => match self.config.zero_fitness_policy {
                ZeroFitnessPolicy::Abort => Err(e),
                ZeroFitnessPolicy::Uniform => {
                    log::warn!(
                        "Generation {}: every fitness is zero, selecting parents uniformly",
                        self.generation_number
                    );
                    let len = self.agents.len();
                    Ok((0..count).map(|_| self.rng.gen_range(0..len)).collect())
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Replace the population with mutated offspring of roulette-selected parents.
    ///
    /// Parents are drawn with replacement. Every selected predictor is
    /// snapshotted before the outgoing generation is released, and each
    /// offspring is restored from its own snapshot. If a restore fails the
    /// population is left empty.
    pub fn generate_next_generation(&mut self) -> Result<()> {
        let parents = self.select_parents()?;

        let snapshots: Vec<PredictorSnapshot> = parents
            .iter()
            .map(|&idx| self.agents[idx].predictor().snapshot())
            .collect();

        self.agents.clear();

        let mut next = Vec::with_capacity(snapshots.len());
        for (id, snapshot) in snapshots.iter().enumerate() {
            let predictor = self.builder.restore(snapshot)?;
            next.push(Agent::new(
                id,
                Some(predictor),
                &self.builder,
                &self.wallet,
                &self.config.mutation,
                &mut self.rng,
            )?);
        }
        self.agents = next;

        Ok(())
    }

    /// Checkpoint the top agent to the configured path, if any
    pub fn save_best_agent(&mut self) -> Result<()> {
        self.sort_by_decreasing_fitness();
        let (Some(path), Some(best)) = (&self.config.checkpoint_path, self.agents.first()) else {
            return Ok(());
        };
        best.save(path, self.generation_number)?;
        log::debug!("Checkpointed agent {} to {}", best.id, path.display());
        Ok(())
    }

    fn dump_best_trades(&self) -> Result<()> {
        let (Some(path), Some(best)) = (&self.config.dump_trades, self.agents.first()) else {
            return Ok(());
        };
        let mut file = BufWriter::new(File::create(path)?);
        best.wallet.dump_trades(&mut file)?;
        file.flush()?;
        Ok(())
    }

    fn rank<C: ProgressCallback>(
        &mut self,
        events: &[Event],
        prices: &[f64],
        season: Option<usize>,
        callback: &mut C,
    ) -> Result<GenerationSummary> {
        callback.on_generation_start(self.generation_number, season);

        self.batch_feed_inputs(events, prices, callback)?;
        let mean_profit = self.report_profits(prices)?;
        self.normalize_fitness();
        self.sort_by_decreasing_fitness();

        if let Err(e) = self.dump_best_trades() {
            log::warn!("Failed to dump trades: {}", e);
        }

        let best = &self.agents[0];
        callback.on_generation_complete(&GenerationReport {
            generation: self.generation_number,
            season,
            mean_profit,
            best_score: best.score,
            best_fitness: best.fitness,
            best_cash_history: &best.wallet.cash_history,
            prices,
        });

        let scores: Vec<f64> = self.agents.iter().map(|a| a.score).collect();
        Ok(GenerationSummary {
            generation: self.generation_number,
            season,
            mean_profit,
            best_score: scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            worst_score: scores.iter().cloned().fold(f64::INFINITY, f64::min),
            best_agent_id: best.id,
            fitness: self.agents.iter().map(|a| a.fitness).collect(),
            scores,
        })
    }

    /// Evaluate and rank the current agents without reproducing.
    pub fn validate(&mut self, events: &[Event], prices: &[f64]) -> Result<GenerationSummary> {
        self.rank(events, prices, None, &mut LogProgressCallback)
    }

    pub fn evolve(&mut self, events: &[Event], prices: &[f64]) -> Result<GenerationSummary> {
        self.evolve_with(events, prices, None, &mut LogProgressCallback)
    }

    /// Run one generation: evaluate, rank, checkpoint the best, reproduce.
    pub fn evolve_with<C: ProgressCallback>(
        &mut self,
        events: &[Event],
        prices: &[f64],
        season: Option<usize>,
        callback: &mut C,
    ) -> Result<GenerationSummary> {
        let summary = self.rank(events, prices, season, callback)?;

        if let Err(e) = self.save_best_agent() {
            log::error!(
                "Generation {}: checkpoint failed, continuing: {}",
                self.generation_number,
                e
            );
        }

        self.generate_next_generation()?;
        self.generation_number += 1;

        Ok(summary)
    }

    pub fn evolve_over_seasons(
        &mut self,
        events: &[Event],
        prices: &[f64],
        num_seasons: usize,
        epochs_per_season: usize,
        roulette: bool,
    ) -> Result<Vec<GenerationSummary>> {
        self.evolve_over_seasons_with(
            events,
            prices,
            num_seasons,
            epochs_per_season,
            roulette,
            &mut LogProgressCallback,
        )
    }

    /// Split the event stream into contiguous seasons and evolve on them.
    ///
    /// Seasons are walked in order, or with `roulette` drawn uniformly with
    /// replacement `num_seasons` times. Each visit runs `epochs_per_season`
    /// generations. Season numbers reported are 1-based.
    pub fn evolve_over_seasons_with<C: ProgressCallback>(
        &mut self,
        events: &[Event],
        prices: &[f64],
        num_seasons: usize,
        epochs_per_season: usize,
        roulette: bool,
        callback: &mut C,
    ) -> Result<Vec<GenerationSummary>> {
        let seasons = split_seasons(events, num_seasons)?;
        self.season_pass(&seasons, prices, epochs_per_season, roulette, None, callback)
    }

    /// Repeat seasonal passes until generation `last_generation` has run.
    ///
    /// Stops mid-pass once the budget is spent, so exactly
    /// `last_generation - generation_number + 1` generations are evolved.
    pub fn evolve_until_with<C: ProgressCallback>(
        &mut self,
        events: &[Event],
        prices: &[f64],
        seasons: &SeasonConfig,
        last_generation: usize,
        callback: &mut C,
    ) -> Result<Vec<GenerationSummary>> {
        let chunks = split_seasons(events, seasons.num_seasons)?;
        if seasons.epochs_per_season == 0 {
            return Err(EvotradeError::Configuration(
                "epochs_per_season must be positive".to_string(),
            ));
        }

        let mut summaries = Vec::new();
        while self.generation_number <= last_generation {
            summaries.extend(self.season_pass(
                &chunks,
                prices,
                seasons.epochs_per_season,
                seasons.roulette,
                Some(last_generation),
                callback,
            )?);
        }
        Ok(summaries)
    }

    fn season_pass<C: ProgressCallback>(
        &mut self,
        seasons: &[&[Event]],
        prices: &[f64],
        epochs_per_season: usize,
        roulette: bool,
        last_generation: Option<usize>,
        callback: &mut C,
    ) -> Result<Vec<GenerationSummary>> {
        let num_seasons = seasons.len();
        let order: Vec<usize> = if roulette {
            (0..num_seasons)
                .map(|_| self.rng.gen_range(0..num_seasons))
                .collect()
        } else {
            (0..num_seasons).collect()
        };

        let mut summaries = Vec::with_capacity(order.len() * epochs_per_season);
        for season in order {
            for _ in 0..epochs_per_season {
                if last_generation.is_some_and(|last| self.generation_number > last) {
                    return Ok(summaries);
                }
                summaries.push(self.evolve_with(seasons[season], prices, Some(season + 1), callback)?);
            }
        }
        Ok(summaries)
    }
}
