use crate::engines::evaluation::FAILED_AGENT_SCORE;
use crate::error::{EvotradeError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What to do when every fitness value is zero and the wheel cannot be spun
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroFitnessPolicy {
    /// Draw parents uniformly at random
    Uniform,
    /// Stop the evolution loop with `ZeroFitnessSum`
    Abort,
}

/// Turn raw scores into a selection distribution.
///
/// Scores are min-max scaled to `[0, 1]` and squared. When every score is
/// tied the range is zero, so `(score - min)^2` is used unscaled. The
/// squared values are divided by their sum; if that sum is zero every
/// fitness is zero. Non-finite scores rank as `FAILED_AGENT_SCORE`.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let scores: Vec<f64> = scores
        .iter()
        .map(|s| if s.is_finite() { *s } else { FAILED_AGENT_SCORE })
        .collect();

    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let scaled: Vec<f64> = if range != 0.0 {
        scores.iter().map(|s| ((s - min) / range).powi(2)).collect()
    } else {
        log::debug!("All {} scores tied at {}; skipping range scaling", scores.len(), min);
        scores.iter().map(|s| (s - min).powi(2)).collect()
    };

    let total: f64 = scaled.iter().sum();
    if total != 0.0 {
        scaled.iter().map(|s| s / total).collect()
    } else {
        vec![0.0; scores.len()]
    }
}

/// Roulette wheel over a discrete fitness distribution
#[derive(Debug, Clone)]
pub struct FitnessWheel {
    cumulative: Vec<f64>,
}

impl FitnessWheel {
    /// Fails with `ZeroFitnessSum` when there is nothing to spin.
    pub fn new(fitness: &[f64], generation: usize) -> Result<Self> {
        let cumulative: Vec<f64> = fitness
            .iter()
            .scan(0.0, |running, f| {
                *running += f;
                Some(*running)
            })
            .collect();

        match cumulative.last() {
            Some(total) if *total > 0.0 => Ok(Self { cumulative }),
            _ => Err(EvotradeError::ZeroFitnessSum { generation }),
        }
    }

    /// First index whose running fitness reaches `r`.
    ///
    /// If rounding leaves the total just short of `r`, the last index wins.
    pub fn select(&self, r: f64) -> usize {
        let idx = self.cumulative.partition_point(|&c| c < r);
        idx.min(self.cumulative.len() - 1)
    }

    /// Draw in `[0, total)` so rounding in the running sum can never land
    /// past the last agent with nonzero fitness.
    pub fn spin<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        self.select(rng.gen::<f64>() * total)
    }
}
