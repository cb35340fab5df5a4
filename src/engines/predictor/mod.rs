//! Trainable decision functions carried by agents.
//!
//! The evolutionary core only ever talks to a predictor through [`Predictor`]
//! and [`PredictorBuilder`]: it runs batched forward passes, reads and writes
//! the nested weight structure, and round-trips [`PredictorSnapshot`]s. It never
//! looks at layer internals.

pub mod dense;
pub mod mutation;

pub use dense::{Activation, DenseNetwork, DenseNetworkBuilder};
pub use mutation::{mutate_kernels, MutationPolicy};

use crate::error::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Trainable parameters of one layer.
///
/// `kernel` is laid out `[input][unit]`, `bias` is `[unit]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub inputs: usize,
    pub units: usize,
    pub activation: Activation,
}

/// Architecture descriptor, enough to rebuild an untrained predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub layers: Vec<LayerSpec>,
}

impl Architecture {
    pub fn input_width(&self) -> usize {
        self.layers.first().map(|l| l.inputs).unwrap_or(0)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(|l| l.units).unwrap_or(0)
    }
}

/// Deep copy of a predictor: architecture plus weights, sharing nothing with the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorSnapshot {
    pub architecture: Architecture,
    pub weights: Vec<LayerWeights>,
}

pub trait Predictor: Send + Sync {
    /// Forward pass over a batch; one output row per input row.
    fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    fn architecture(&self) -> Architecture;

    fn weights(&self) -> Vec<LayerWeights>;

    fn set_weights(&mut self, weights: Vec<LayerWeights>) -> Result<()>;

    fn snapshot(&self) -> PredictorSnapshot {
        PredictorSnapshot {
            architecture: self.architecture(),
            weights: self.weights(),
        }
    }

    /// Mutate kernels in place according to `policy`; biases are left alone.
    fn mutate<R: Rng + ?Sized>(&mut self, policy: &MutationPolicy, rng: &mut R) -> Result<usize>
    where
        Self: Sized,
    {
        let mut weights = self.weights();
        let mutated = mutate_kernels(&mut weights, policy, rng)?;
        self.set_weights(weights)?;
        Ok(mutated)
    }

    /// Independent copy with the mutation policy applied.
    fn clone_and_mutate<R: Rng + ?Sized>(&self, policy: &MutationPolicy, rng: &mut R) -> Result<Self>
    where
        Self: Sized + Clone,
    {
        let mut child = self.clone();
        child.mutate(policy, rng)?;
        Ok(child)
    }
}

pub trait PredictorBuilder: Send + Sync {
    type Output: Predictor;

    /// Fresh, randomly initialised predictor
    fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Output;

    /// Rebuild a predictor from a snapshot taken earlier
    fn restore(&self, snapshot: &PredictorSnapshot) -> Result<Self::Output>;
}
