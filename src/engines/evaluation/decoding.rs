use crate::{
    error::{EvotradeError, Result},
    types::Action,
};
use serde::{Deserialize, Serialize};

/// How predictor output rows map to trade actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodingMode {
    /// One output: `>= 0` buys, anything else sells
    SingleOutput,
    /// Argmax over `[buy, sell]` or `[buy, sell, sleep]`
    MultiOutput { sleep: bool },
}

impl DecodingMode {
    pub fn output_width(&self) -> usize {
        match self {
            DecodingMode::SingleOutput => 1,
            DecodingMode::MultiOutput { sleep: true } => 3,
            DecodingMode::MultiOutput { sleep: false } => 2,
        }
    }

    pub fn decode(&self, row: &[f64]) -> Result<Action> {
        if row.len() != self.output_width() {
            return Err(EvotradeError::Prediction(format!(
                "{:?} expects {} outputs, got {}",
                self,
                self.output_width(),
                row.len()
            )));
        }

        let action = match self {
            DecodingMode::SingleOutput => {
                if row[0] >= 0.0 {
                    Action::Buy
                } else {
                    Action::Sell
                }
            }
            DecodingMode::MultiOutput { sleep } => match (argmax(row), *sleep) {
                (0, _) => Action::Buy,
                (1, true) => Action::Sell,
                (_, true) => Action::Sleep,
                (_, false) => Action::Sell,
            },
        };
        Ok(action)
    }

    pub fn decode_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<Action>> {
        rows.iter().map(|row| self.decode(row)).collect()
    }
}

/// Index of the first maximum
fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in row.iter().enumerate().skip(1) {
        if *value > row[best] {
            best = idx;
        }
    }
    best
}
