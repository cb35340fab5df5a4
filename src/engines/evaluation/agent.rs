use super::{DecodingMode, Wallet};
use crate::{
    data::checkpoint::Checkpoint,
    engines::predictor::{MutationPolicy, Predictor, PredictorBuilder},
    error::{EvotradeError, Result},
    types::{Action, Event},
};
use rand::Rng;
use std::path::Path;

/// Score given to an agent whose evaluation failed: every unit of cash lost.
pub const FAILED_AGENT_SCORE: f64 = -100.0;

/// Wallet parameters shared by every agent of a population
#[derive(Debug, Clone, PartialEq)]
pub struct WalletParams {
    pub starting_cash: Vec<f64>,
    pub starting_price: Vec<f64>,
    pub trading_fee: f64,
}

impl WalletParams {
    pub fn num_assets(&self) -> usize {
        self.starting_cash.len()
    }

    pub fn new_wallet(&self) -> Result<Wallet> {
        Wallet::new(
            self.starting_cash.clone(),
            self.starting_price.clone(),
            self.trading_fee,
        )
    }
}

/// One predictor bound to one wallet
#[derive(Debug)]
pub struct Agent<P: Predictor> {
    pub id: usize,
    predictor: P,
    pub wallet: Wallet,
    /// Mean swing earnings over the last evaluated batch
    pub score: f64,
    /// Selection probability after normalisation
    pub fitness: f64,
}

impl<P: Predictor> Agent<P> {
    /// Inherit and mutate `inherited` if given, otherwise build a fresh predictor.
    pub fn new<B, R>(
        id: usize,
        inherited: Option<P>,
        builder: &B,
        wallet: &WalletParams,
        mutation: &MutationPolicy,
        rng: &mut R,
    ) -> Result<Self>
    where
        B: PredictorBuilder<Output = P>,
        R: Rng + ?Sized,
    {
        let wallet = wallet.new_wallet()?;
        match inherited {
            Some(predictor) => {
                let mut agent = Self::with_predictor(id, predictor, wallet);
                agent.mutate(mutation, rng)?;
                Ok(agent)
            }
            None => Ok(Self::with_predictor(id, builder.build(rng), wallet)),
        }
    }

    fn with_predictor(id: usize, predictor: P, wallet: Wallet) -> Self {
        Self {
            id,
            predictor,
            wallet,
            score: 0.0,
            fitness: 0.0,
        }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Run a batch of events through the predictor and trade on the decoded actions.
    ///
    /// After every event the touched asset is force-closed at its price and the
    /// resulting swing earnings recorded; `score` becomes their mean.
    pub fn batch_act(&mut self, events: &[Event], prices: &[f64], mode: DecodingMode) -> Result<()> {
        let assets = prices.len();
        if assets != self.wallet.num_assets() {
            return Err(EvotradeError::Configuration(format!(
                "prices cover {} assets, wallet holds {}",
                assets,
                self.wallet.num_assets()
            )));
        }
        if let Some(event) = events.iter().find(|e| e.asset >= assets) {
            return Err(EvotradeError::AssetIndex {
                index: event.asset,
                assets,
            });
        }
        if events.is_empty() {
            self.score = 0.0;
            return Ok(());
        }

        let inputs: Vec<Vec<f64>> = events
            .iter()
            .map(|event| {
                let mut row = vec![0.0; assets];
                row[event.asset] = event.magnitude;
                row
            })
            .collect();

        let predictions = self.predictor.predict(&inputs)?;
        if predictions.len() != events.len() {
            return Err(EvotradeError::Prediction(format!(
                "{} predictions for {} events",
                predictions.len(),
                events.len()
            )));
        }
        let actions = mode.decode_batch(&predictions)?;

        let mut earnings = Vec::with_capacity(events.len());
        for (event, action) in events.iter().zip(actions) {
            let price = prices[event.asset];
            match action {
                Action::Buy => self.wallet.buy(event.asset, price)?,
                Action::Sell => self.wallet.sell(event.asset, price)?,
                Action::Sleep => {}
            }
            earnings.push(self.wallet.get_swing_earnings(event.asset, price)?);
        }

        self.score = earnings.iter().sum::<f64>() / earnings.len() as f64;
        Ok(())
    }

    /// [`Agent::batch_act`] with failures isolated: a failing agent gets
    /// [`FAILED_AGENT_SCORE`] so the generation can still be ranked.
    pub fn evaluate(&mut self, events: &[Event], prices: &[f64], mode: DecodingMode) -> bool {
        match self.batch_act(events, prices, mode) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Agent {} failed evaluation: {}", self.id, e);
                self.score = FAILED_AGENT_SCORE;
                false
            }
        }
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, policy: &MutationPolicy, rng: &mut R) -> Result<()> {
        let mutated = self.predictor.mutate(policy, rng)?;
        log::trace!("Agent {}: mutated {} weights", self.id, mutated);
        Ok(())
    }

    /// Checkpoint this agent's predictor to `path`, replacing any previous file atomically.
    pub fn save<Q: AsRef<Path>>(&self, path: Q, generation: usize) -> Result<()> {
        Checkpoint::from_agent(self, generation).write_atomic(path)
    }
}
