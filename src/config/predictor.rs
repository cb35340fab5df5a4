use super::traits::{section_error, ConfigSection};
use crate::engines::predictor::Activation;
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub hidden_units: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            hidden_units: vec![100],
            hidden_activation: Activation::Relu,
            output_activation: Activation::Softmax,
        }
    }
}

impl ConfigSection for PredictorConfig {
    fn section_name() -> &'static str {
        "predictor"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        if self.hidden_units.iter().any(|&units| units == 0) {
            return Err(section_error(
                Self::section_name(),
                "hidden layers must have at least one unit",
            ));
        }
        Ok(())
    }
}
