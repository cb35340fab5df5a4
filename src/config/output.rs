use super::traits::ConfigSection;
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the best agent of every generation is checkpointed
    pub checkpoint_path: Option<PathBuf>,
    /// Where the best agent's trade ledger is dumped after ranking
    pub dump_trades: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: Some(PathBuf::from("saved_agent/best_agent.json")),
            dump_trades: None,
        }
    }
}

impl ConfigSection for OutputConfig {
    fn section_name() -> &'static str {
        "output"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        Ok(())
    }
}
