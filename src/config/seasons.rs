use super::traits::{section_error, ConfigSection};
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub num_seasons: usize,
    pub epochs_per_season: usize,
    /// Sample seasons uniformly with replacement instead of walking them in order
    pub roulette: bool,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            num_seasons: 4,
            epochs_per_season: 1,
            roulette: false,
        }
    }
}

impl ConfigSection for SeasonConfig {
    fn section_name() -> &'static str {
        "seasons"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        if self.num_seasons == 0 {
            return Err(section_error(Self::section_name(), "num_seasons must be positive"));
        }
        if self.epochs_per_season == 0 {
            return Err(section_error(
                Self::section_name(),
                "epochs_per_season must be positive",
            ));
        }
        Ok(())
    }
}
