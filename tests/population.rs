mod common;

use common::{assert_close, RecordingCallback, ScriptedBuilder};
use evotrade::data::{Checkpoint, StaticMarketData};
use evotrade::engines::evaluation::{DecodingMode, FAILED_AGENT_SCORE};
use evotrade::config::SeasonConfig;
use evotrade::engines::generation::{Population, PopulationConfig, ZeroFitnessPolicy};
use evotrade::engines::predictor::{
    Activation, DenseNetworkBuilder, MutationPolicy, Predictor, PredictorSnapshot,
};
use evotrade::error::EvotradeError;
use evotrade::types::Event;
use tempfile::tempdir;

const PRICES: [f64; 2] = [10.0, 20.0];

fn config(population_size: usize) -> PopulationConfig {
    PopulationConfig {
        population_size,
        mutation: MutationPolicy::new(0.0, 0.3),
        starting_cash: vec![100.0, 100.0],
        trading_fee: 0.01,
        decoding: DecodingMode::SingleOutput,
        zero_fitness_policy: ZeroFitnessPolicy::Uniform,
        checkpoint_path: None,
        dump_trades: None,
        seed: Some(11),
        big_bang: true,
    }
}

fn market() -> StaticMarketData {
    StaticMarketData::new(PRICES.to_vec())
}

/// Even agents always buy (and lose two fees), odd agents always sell (and stay flat)
fn buyers_and_sellers() -> ScriptedBuilder {
    ScriptedBuilder::new(2, vec![vec![1.0], vec![-1.0]])
}

fn events() -> Vec<Event> {
    vec![Event::new(0, 1.0), Event::new(1, 1.0)]
}

fn bias_of<P: Predictor>(predictor: &P) -> Vec<f64> {
    predictor.weights()[0].bias.clone()
}

#[test]
fn test_generation_ranks_and_reproduces_fittest() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();
    assert_eq!(population.generation_number(), 1);
    assert_eq!(population.agents().len(), 4);

    let summary = population.evolve(&events(), &PRICES).unwrap();

    assert_eq!(summary.generation, 1);
    assert_eq!(summary.best_agent_id, 1);
    assert_close(summary.best_score, 0.0);
    assert_close(summary.worst_score, -1.99);
    assert_close(summary.mean_profit, -0.995);
    assert_eq!(summary.fitness.len(), 4);
    assert_close(summary.fitness.iter().sum::<f64>(), 1.0);
    assert_close(summary.fitness[0], 0.5);
    assert_close(summary.fitness[1], 0.5);
    assert_close(summary.fitness[3], 0.0);
    assert!(summary.fitness.windows(2).all(|w| w[0] >= w[1]));

    // Only the zero-loss sellers carry any fitness, so every child is one
    assert_eq!(population.generation_number(), 2);
    assert_eq!(population.agents().len(), 4);
    for (id, agent) in population.agents().iter().enumerate() {
        assert_eq!(agent.id, id);
        assert_eq!(bias_of(agent.predictor()), vec![-1.0]);
        assert!(agent.wallet.get_trades().is_empty());
    }
}

#[test]
fn test_zero_fitness_abort_stops() {
    let mut cfg = config(4);
    cfg.zero_fitness_policy = ZeroFitnessPolicy::Abort;
    let mut population = Population::new(cfg, buyers_and_sellers(), &market()).unwrap();

    population.evolve(&events(), &PRICES).unwrap();
    // Every agent now sells, so every score ties at zero
    let result = population.evolve(&events(), &PRICES);

    assert!(matches!(
        result,
        Err(EvotradeError::ZeroFitnessSum { generation: 2 })
    ));
}

#[test]
fn test_zero_fitness_uniform_continues() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();

    population.evolve(&events(), &PRICES).unwrap();
    let summary = population.evolve(&events(), &PRICES).unwrap();

    assert!(summary.fitness.iter().all(|f| *f == 0.0));
    assert_eq!(population.agents().len(), 4);
    assert_eq!(population.generation_number(), 3);
}

#[test]
fn test_pool_selection_surfaces_zero_fitness() {
    let mut population = Population::new(config(3), buyers_and_sellers(), &market()).unwrap();

    let result = population.pool_selection();

    assert!(matches!(
        result,
        Err(EvotradeError::ZeroFitnessSum { generation: 1 })
    ));
}

#[test]
fn test_pool_selection_only_picks_fit_agents() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();
    let mut callback = RecordingCallback::default();

    population
        .batch_feed_inputs(&events(), &PRICES, &mut callback)
        .unwrap();
    population.normalize_fitness();

    for _ in 0..50 {
        let idx = population.pool_selection().unwrap();
        assert_eq!(idx % 2, 1);
    }
    assert_eq!(callback.evaluated, vec![(0, 4)]);
}

#[test]
fn test_failing_agents_are_isolated() {
    // Odd agents emit two outputs, which single-output decoding rejects
    let builder = ScriptedBuilder::new(2, vec![vec![-1.0], vec![1.0, 1.0]]);
    let mut population = Population::new(config(4), builder, &market()).unwrap();
    let mut callback = RecordingCallback::default();

    let summary = population
        .evolve_with(&events(), &PRICES, None, &mut callback)
        .unwrap();

    assert_eq!(callback.evaluated, vec![(2, 4)]);
    assert_close(summary.worst_score, FAILED_AGENT_SCORE);
    assert_close(summary.best_score, 0.0);
    for agent in population.agents() {
        assert_eq!(bias_of(agent.predictor()), vec![-1.0]);
    }
}

#[test]
fn test_price_length_mismatch_is_configuration_error() {
    let mut population = Population::new(config(2), buyers_and_sellers(), &market()).unwrap();

    let result = population.evolve(&events(), &[10.0]);

    assert!(matches!(result, Err(EvotradeError::Configuration(_))));
}

#[test]
fn test_event_asset_out_of_range_is_fatal() {
    let mut population = Population::new(config(2), buyers_and_sellers(), &market()).unwrap();

    let result = population.evolve(&[Event::new(2, 1.0)], &PRICES);

    assert!(matches!(
        result,
        Err(EvotradeError::AssetIndex { index: 2, assets: 2 })
    ));
}

#[test]
fn test_construction_preconditions() {
    let empty = Population::new(config(0), buyers_and_sellers(), &market());
    assert!(matches!(empty, Err(EvotradeError::Configuration(_))));

    let mut cfg = config(2);
    cfg.starting_cash = vec![100.0];
    let mismatched = Population::new(cfg, buyers_and_sellers(), &market());
    assert!(matches!(mismatched, Err(EvotradeError::Configuration(_))));

    let mut cfg = config(2);
    cfg.starting_cash = vec![100.0, -1.0];
    let negative = Population::new(cfg, buyers_and_sellers(), &market());
    assert!(matches!(negative, Err(EvotradeError::Configuration(_))));
}

#[test]
fn test_sequential_seasons() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();
    let mut callback = RecordingCallback::default();
    let events: Vec<Event> = (0..5).map(|i| Event::new(i % 2, 1.0)).collect();

    let summaries = population
        .evolve_over_seasons_with(&events, &PRICES, 2, 2, false, &mut callback)
        .unwrap();

    let seasons: Vec<Option<usize>> = summaries.iter().map(|s| s.season).collect();
    assert_eq!(seasons, vec![Some(1), Some(1), Some(2), Some(2)]);
    let generations: Vec<usize> = summaries.iter().map(|s| s.generation).collect();
    assert_eq!(generations, vec![1, 2, 3, 4]);
    assert_eq!(callback.started.len(), 4);
    assert_eq!(callback.completed.len(), 4);
    assert_eq!(population.generation_number(), 5);
}

#[test]
fn test_roulette_seasons() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();
    let events: Vec<Event> = (0..9).map(|i| Event::new(i % 2, 1.0)).collect();

    let summaries = population
        .evolve_over_seasons(&events, &PRICES, 3, 1, true)
        .unwrap();

    assert_eq!(summaries.len(), 3);
    for summary in &summaries {
        let season = summary.season.unwrap();
        assert!((1..=3).contains(&season));
    }
}

#[test]
fn test_best_agent_is_checkpointed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("saved").join("best_agent.json");
    let mut cfg = config(4);
    cfg.checkpoint_path = Some(path.clone());
    let mut population = Population::new(cfg, buyers_and_sellers(), &market()).unwrap();

    population.evolve(&events(), &PRICES).unwrap();

    let checkpoint = Checkpoint::load(&path).unwrap();
    assert_eq!(checkpoint.generation, 1);
    assert_eq!(checkpoint.agent_id, 1);
    assert_close(checkpoint.score, 0.0);
    assert_eq!(checkpoint.predictor.weights[0].bias, vec![-1.0]);
}

#[test]
fn test_trade_dump_written_for_best_agent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trades.txt");
    let mut cfg = config(2);
    cfg.dump_trades = Some(path.clone());
    // Both agents buy; the best one has four ledger rows
    let builder = ScriptedBuilder::new(2, vec![vec![1.0]]);
    let mut population = Population::new(cfg, builder, &market()).unwrap();

    population.validate(&events(), &PRICES).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("idx"));
    assert_eq!(population.generation_number(), 1);
}

#[test]
fn test_seeding_from_snapshot() {
    let mut cfg = config(3);
    cfg.big_bang = false;
    let builder = ScriptedBuilder::new(2, vec![vec![1.0]]);
    let mut population = Population::new(cfg, builder, &market()).unwrap();
    assert!(population.agents().is_empty());
    assert!(matches!(
        population.evolve(&events(), &PRICES),
        Err(EvotradeError::Configuration(_))
    ));

    let donor = common::LinearPredictor::constant(2, vec![-2.5]);
    let snapshot: PredictorSnapshot = donor.snapshot();
    population.seed_from_snapshot(&snapshot).unwrap();

    assert_eq!(population.agents().len(), 3);
    for agent in population.agents() {
        assert_eq!(agent.predictor().snapshot(), snapshot);
    }
}

#[test]
fn test_dense_network_population_smoke() {
    let builder = DenseNetworkBuilder::new(2, &[4], Activation::Relu, 3, Activation::Softmax);
    let mut cfg = config(6);
    cfg.decoding = DecodingMode::MultiOutput { sleep: true };
    cfg.mutation = MutationPolicy::new(0.2, 0.3);
    let mut population = Population::new(cfg, builder, &market()).unwrap();
    let events: Vec<Event> = (0..20)
        .map(|i| Event::new(i % 2, (i as f64 * 0.7).sin()))
        .collect();

    for generation in 1..=3 {
        let summary = population.evolve(&events, &PRICES).unwrap();
        assert_eq!(summary.generation, generation);
        assert_eq!(summary.fitness.len(), 6);
        assert!(summary.fitness.windows(2).all(|w| w[0] >= w[1]));
        let total: f64 = summary.fitness.iter().sum();
        assert!((total - 1.0).abs() < 1e-9 || total == 0.0);
        assert_eq!(population.agents().len(), 6);
    }
}

#[test]
fn test_non_positive_price_is_rejected() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();

    let zero = population.evolve(&events(), &[0.0, 20.0]);
    assert!(matches!(zero, Err(EvotradeError::Configuration(_))));

    let nan = population.evolve(&events(), &[10.0, f64::NAN]);
    assert!(matches!(nan, Err(EvotradeError::Configuration(_))));

    assert_eq!(population.generation_number(), 1);
}

#[test]
fn test_zero_starting_price_is_rejected() {
    let market = StaticMarketData::new(vec![10.0, 0.0]);

    let result = Population::new(config(2), buyers_and_sellers(), &market);

    assert!(matches!(result, Err(EvotradeError::Configuration(_))));
}

#[test]
fn test_snapshot_with_wrong_shape_is_rejected() {
    let mut cfg = config(4);
    cfg.big_bang = false;
    let mut population = Population::new(cfg, buyers_and_sellers(), &market()).unwrap();

    // Three outputs cannot drive single-output decoding
    let wide = common::LinearPredictor::constant(2, vec![0.0, 0.0, 0.0]).snapshot();
    assert!(matches!(
        population.seed_from_snapshot(&wide),
        Err(EvotradeError::Configuration(_))
    ));

    // One input per asset is required
    let narrow = common::LinearPredictor::constant(3, vec![0.0]).snapshot();
    assert!(matches!(
        population.seed_from_snapshot(&narrow),
        Err(EvotradeError::Configuration(_))
    ));

    assert!(population.agents().is_empty());
}

#[test]
fn test_unwritable_checkpoint_does_not_abort() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let mut cfg = config(4);
    cfg.checkpoint_path = Some(blocker.join("best_agent.json"));
    let mut population = Population::new(cfg, buyers_and_sellers(), &market()).unwrap();

    let summary = population.evolve(&events(), &PRICES).unwrap();

    assert_eq!(summary.generation, 1);
    assert_eq!(population.generation_number(), 2);
    assert_eq!(population.agents().len(), 4);
}

#[test]
fn test_unwritable_trade_dump_does_not_abort() {
    let dir = tempdir().unwrap();
    let mut cfg = config(2);
    cfg.dump_trades = Some(dir.path().join("missing").join("trades.txt"));
    let mut population = Population::new(cfg, buyers_and_sellers(), &market()).unwrap();

    let summary = population.evolve(&events(), &PRICES).unwrap();

    assert_eq!(summary.fitness.len(), 2);
    assert_eq!(population.generation_number(), 2);
}

#[test]
fn test_generation_budget_stops_mid_pass() {
    let mut population = Population::new(config(4), buyers_and_sellers(), &market()).unwrap();
    let mut callback = RecordingCallback::default();
    let events: Vec<Event> = (0..8).map(|i| Event::new(i % 2, 1.0)).collect();
    let seasons = SeasonConfig {
        num_seasons: 4,
        epochs_per_season: 1,
        roulette: false,
    };

    let summaries = population
        .evolve_until_with(&events, &PRICES, &seasons, 6, &mut callback)
        .unwrap();

    let generations: Vec<usize> = summaries.iter().map(|s| s.generation).collect();
    assert_eq!(generations, vec![1, 2, 3, 4, 5, 6]);
    let seasons: Vec<Option<usize>> = summaries.iter().map(|s| s.season).collect();
    assert_eq!(
        seasons,
        vec![Some(1), Some(2), Some(3), Some(4), Some(1), Some(2)]
    );
    assert_eq!(population.generation_number(), 7);
    assert_eq!(callback.started.len(), 6);
}
