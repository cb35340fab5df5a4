use super::{Architecture, LayerSpec, LayerWeights, Predictor, PredictorBuilder, PredictorSnapshot};
use crate::error::{EvotradeError, Result};
use rand::distributions::Uniform;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl Activation {
    fn apply(&self, values: &mut [f64]) {
        match self {
            Activation::Linear => {}
            Activation::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Sigmoid => values.iter_mut().for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Activation::Tanh => values.iter_mut().for_each(|v| *v = v.tanh()),
            Activation::Softmax => {
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                values.iter_mut().for_each(|v| *v = (*v - max).exp());
                let total: f64 = values.iter().sum();
                if total > 0.0 {
                    values.iter_mut().for_each(|v| *v /= total);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    spec: LayerSpec,
    weights: LayerWeights,
}

impl DenseLayer {
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut output = self.weights.bias.clone();
        for (x, row) in input.iter().zip(self.weights.kernel.iter()) {
            if *x == 0.0 {
                continue;
            }
            for (out, w) in output.iter_mut().zip(row.iter()) {
                *out += x * w;
            }
        }
        self.spec.activation.apply(&mut output);
        output
    }
}

/// Fully connected feed-forward network
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Zero-initialised network with the given architecture
    pub fn zeros(architecture: &Architecture) -> Self {
        let layers = architecture
            .layers
            .iter()
            .map(|spec| DenseLayer {
                spec: spec.clone(),
                weights: LayerWeights {
                    kernel: vec![vec![0.0; spec.units]; spec.inputs],
                    bias: vec![0.0; spec.units],
                },
            })
            .collect();
        Self { layers }
    }

    /// Glorot-uniform kernels and zero biases
    pub fn random<R: Rng + ?Sized>(architecture: &Architecture, rng: &mut R) -> Self {
        let mut network = Self::zeros(architecture);
        for layer in network.layers.iter_mut() {
            let limit = (6.0 / (layer.spec.inputs + layer.spec.units) as f64).sqrt();
            let uniform = Uniform::new_inclusive(-limit, limit);
            for row in layer.weights.kernel.iter_mut() {
                for w in row.iter_mut() {
                    *w = rng.sample(uniform);
                }
            }
        }
        network
    }

    fn check_shapes(&self, weights: &[LayerWeights]) -> Result<()> {
        if weights.len() != self.layers.len() {
            return Err(EvotradeError::Prediction(format!(
                "Expected weights for {} layers, got {}",
                self.layers.len(),
                weights.len()
            )));
        }
        for (idx, (layer, w)) in self.layers.iter().zip(weights).enumerate() {
            let rows_ok = w.kernel.len() == layer.spec.inputs;
            let cols_ok = w.kernel.iter().all(|row| row.len() == layer.spec.units);
            if !rows_ok || !cols_ok || w.bias.len() != layer.spec.units {
                return Err(EvotradeError::Prediction(format!(
                    "Layer {} expects a {}x{} kernel and {} biases",
                    idx, layer.spec.inputs, layer.spec.units, layer.spec.units
                )));
            }
        }
        Ok(())
    }
}

impl Predictor for DenseNetwork {
    fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let width = self.architecture().input_width();
        inputs
            .iter()
            .map(|row| {
                if row.len() != width {
                    return Err(EvotradeError::Prediction(format!(
                        "Input row has width {}, network expects {}",
                        row.len(),
                        width
                    )));
                }
                Ok(self
                    .layers
                    .iter()
                    .fold(row.clone(), |activations, layer| layer.forward(&activations)))
            })
            .collect()
    }

    fn architecture(&self) -> Architecture {
        Architecture {
            layers: self.layers.iter().map(|l| l.spec.clone()).collect(),
        }
    }

    fn weights(&self) -> Vec<LayerWeights> {
        self.layers.iter().map(|l| l.weights.clone()).collect()
    }

    fn set_weights(&mut self, weights: Vec<LayerWeights>) -> Result<()> {
        self.check_shapes(&weights)?;
        for (layer, w) in self.layers.iter_mut().zip(weights) {
            layer.weights = w;
        }
        Ok(())
    }
}

/// Builds [`DenseNetwork`]s of a fixed architecture
#[derive(Debug, Clone)]
pub struct DenseNetworkBuilder {
    architecture: Architecture,
}

impl DenseNetworkBuilder {
    pub fn new(
        inputs: usize,
        hidden_units: &[usize],
        hidden_activation: Activation,
        outputs: usize,
        output_activation: Activation,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden_units.len() + 1);
        let mut fan_in = inputs;
        for &units in hidden_units {
            layers.push(LayerSpec {
                inputs: fan_in,
                units,
                activation: hidden_activation,
            });
            fan_in = units;
        }
        layers.push(LayerSpec {
            inputs: fan_in,
            units: outputs,
            activation: output_activation,
        });

        Self {
            architecture: Architecture { layers },
        }
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }
}

impl PredictorBuilder for DenseNetworkBuilder {
    type Output = DenseNetwork;

    fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> DenseNetwork {
        DenseNetwork::random(&self.architecture, rng)
    }

    fn restore(&self, snapshot: &PredictorSnapshot) -> Result<DenseNetwork> {
        let mut network = DenseNetwork::zeros(&snapshot.architecture);
        network.set_weights(snapshot.weights.clone())?;
        Ok(network)
    }
}
