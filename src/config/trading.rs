use super::traits::{section_error, ConfigSection};
use crate::engines::evaluation::DecodingMode;
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Cash allotted to every asset at the start of an evaluation
    pub starting_cash: f64,
    pub trading_fee: f64,
    pub decoding: DecodingMode,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            starting_cash: 2.5,
            trading_fee: 0.01,
            decoding: DecodingMode::MultiOutput { sleep: true },
        }
    }
}

impl TradingConfig {
    pub fn starting_cash_for(&self, assets: usize) -> Vec<f64> {
        vec![self.starting_cash; assets]
    }
}

impl ConfigSection for TradingConfig {
    fn section_name() -> &'static str {
        "trading"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        let name = Self::section_name();
        if self.starting_cash.is_nan() || self.starting_cash <= 0.0 {
            return Err(section_error(name, "starting_cash must be positive"));
        }
        if !(0.0..1.0).contains(&self.trading_fee) {
            return Err(section_error(name, "trading_fee must be in [0, 1)"));
        }
        Ok(())
    }
}
