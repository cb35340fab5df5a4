#![allow(dead_code)]

use evotrade::engines::generation::{GenerationReport, ProgressCallback};
use evotrade::engines::predictor::{
    Activation, Architecture, LayerSpec, LayerWeights, Predictor, PredictorBuilder,
    PredictorSnapshot,
};
use evotrade::error::{EvotradeError, Result};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Single linear layer, so test outcomes can be read straight off the bias
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    pub inputs: usize,
    pub weights: LayerWeights,
}

impl LinearPredictor {
    pub fn constant(inputs: usize, output: Vec<f64>) -> Self {
        Self {
            inputs,
            weights: LayerWeights {
                kernel: vec![vec![0.0; output.len()]; inputs],
                bias: output,
            },
        }
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Ok(inputs
            .iter()
            .map(|row| {
                let mut out = self.weights.bias.clone();
                for (x, kernel_row) in row.iter().zip(&self.weights.kernel) {
                    for (o, w) in out.iter_mut().zip(kernel_row) {
                        *o += x * w;
                    }
                }
                out
            })
            .collect())
    }

    fn architecture(&self) -> Architecture {
        Architecture {
            layers: vec![LayerSpec {
                inputs: self.inputs,
                units: self.weights.bias.len(),
                activation: Activation::Linear,
            }],
        }
    }

    fn weights(&self) -> Vec<LayerWeights> {
        vec![self.weights.clone()]
    }

    fn set_weights(&mut self, mut weights: Vec<LayerWeights>) -> Result<()> {
        self.weights = weights
            .pop()
            .ok_or_else(|| EvotradeError::Prediction("no layers".to_string()))?;
        Ok(())
    }
}

/// Hands out constant-output predictors, cycling through `outputs` in build order
pub struct ScriptedBuilder {
    pub inputs: usize,
    pub outputs: Vec<Vec<f64>>,
    next: AtomicUsize,
}

impl ScriptedBuilder {
    pub fn new(inputs: usize, outputs: Vec<Vec<f64>>) -> Self {
        Self {
            inputs,
            outputs,
            next: AtomicUsize::new(0),
        }
    }
}

impl PredictorBuilder for ScriptedBuilder {
    type Output = LinearPredictor;

    fn build<R: Rng + ?Sized>(&self, _rng: &mut R) -> LinearPredictor {
        let idx = self.next.fetch_add(1, Ordering::SeqCst) % self.outputs.len();
        LinearPredictor::constant(self.inputs, self.outputs[idx].clone())
    }

    fn restore(&self, snapshot: &PredictorSnapshot) -> Result<LinearPredictor> {
        let mut predictor = LinearPredictor::constant(snapshot.architecture.input_width(), vec![]);
        predictor.set_weights(snapshot.weights.clone())?;
        Ok(predictor)
    }
}

#[derive(Debug, Default)]
pub struct RecordingCallback {
    pub started: Vec<(usize, Option<usize>)>,
    pub evaluated: Vec<(usize, usize)>,
    pub completed: Vec<(usize, f64)>,
}

impl ProgressCallback for RecordingCallback {
    fn on_generation_start(&mut self, generation: usize, season: Option<usize>) {
        self.started.push((generation, season));
    }

    fn on_agents_evaluated(&mut self, failed: usize, total: usize) {
        self.evaluated.push((failed, total));
    }

    fn on_generation_complete(&mut self, report: &GenerationReport<'_>) {
        self.completed.push((report.generation, report.best_score));
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
