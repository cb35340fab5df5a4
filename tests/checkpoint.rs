use evotrade::data::Checkpoint;
use evotrade::engines::evaluation::{Agent, WalletParams};
use evotrade::engines::predictor::{
    Activation, DenseNetwork, DenseNetworkBuilder, MutationPolicy, Predictor, PredictorBuilder,
};
use evotrade::error::EvotradeError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn builder() -> DenseNetworkBuilder {
    DenseNetworkBuilder::new(2, &[5], Activation::Relu, 3, Activation::Softmax)
}

fn agent(id: usize, seed: u64) -> Agent<DenseNetwork> {
    let wallet = WalletParams {
        starting_cash: vec![2.5, 2.5],
        starting_price: vec![1.0, 2.0],
        trading_fee: 0.01,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    Agent::new(
        id,
        None,
        &builder(),
        &wallet,
        &MutationPolicy::new(0.05, 0.3),
        &mut rng,
    )
    .unwrap()
}

#[test]
fn test_save_and_restore_predictor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("best_agent.json");
    let mut saved = agent(3, 21);
    saved.score = 4.5;

    saved.save(&path, 12).unwrap();
    let checkpoint = Checkpoint::load(&path).unwrap();

    assert_eq!(checkpoint.generation, 12);
    assert_eq!(checkpoint.agent_id, 3);
    assert_eq!(checkpoint.score, 4.5);
    assert_eq!(checkpoint.predictor, saved.predictor().snapshot());

    let restored = builder().restore(&checkpoint.predictor).unwrap();
    let inputs = vec![vec![0.0, 1.5], vec![-2.0, 0.0]];
    assert_eq!(
        restored.predict(&inputs).unwrap(),
        saved.predictor().predict(&inputs).unwrap()
    );
}

#[test]
fn test_overwrite_replaces_previous_checkpoint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("best_agent.json");

    agent(0, 1).save(&path, 1).unwrap();
    let second = agent(1, 2);
    second.save(&path, 2).unwrap();

    let checkpoint = Checkpoint::load(&path).unwrap();
    assert_eq!(checkpoint.generation, 2);
    assert_eq!(checkpoint.agent_id, 1);
    assert_eq!(checkpoint.predictor, second.predictor().snapshot());

    // Only the checkpoint itself remains; no temp file left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_missing_checkpoint_is_persistence_error() {
    let dir = tempdir().unwrap();

    let result = Checkpoint::load(dir.path().join("nope.json"));

    assert!(matches!(result, Err(EvotradeError::Persistence(_))));
}

#[test]
fn test_restore_rejects_mismatched_weights() {
    let saved = agent(0, 5);
    let mut snapshot = saved.predictor().snapshot();
    snapshot.weights[0].bias.push(1.0);

    assert!(builder().restore(&snapshot).is_err());
}
