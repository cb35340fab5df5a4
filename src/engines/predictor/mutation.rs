use super::LayerWeights;
use crate::error::{EvotradeError, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Per-element Gaussian mutation applied during reproduction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationPolicy {
    /// Probability that any single kernel element is perturbed
    pub rate: f64,
    pub scale: f64,
}

impl MutationPolicy {
    pub fn new(rate: f64, scale: f64) -> Self {
        Self { rate, scale }
    }

    /// Standard deviation of the noise actually added
    pub fn noise_std(&self) -> f64 {
        self.scale * 0.5
    }
}

/// Mutation: perturb kernel elements with independent Bernoulli(`rate`) gating.
///
/// Only kernels drift; biases keep the values they were built with. The
/// training scheme this mirrors walked kernels alone, most likely by accident;
/// the asymmetry is kept on purpose so evolved weights stay comparable.
///
/// Returns how many elements were perturbed.
pub fn mutate_kernels<R: Rng + ?Sized>(
    layers: &mut [LayerWeights],
    policy: &MutationPolicy,
    rng: &mut R,
) -> Result<usize> {
    let noise = Normal::new(0.0, policy.noise_std())
        .map_err(|e| EvotradeError::Configuration(format!("Invalid mutation scale: {}", e)))?;

    let mut mutated = 0;
    for weight in layers
        .iter_mut()
        .flat_map(|layer| layer.kernel.iter_mut())
        .flat_map(|row| row.iter_mut())
    {
        if rng.gen::<f64>() < policy.rate {
            *weight += noise.sample(rng);
            mutated += 1;
        }
    }

    Ok(mutated)
}
