use super::{
    evolution::EvolutionConfig,
    output::OutputConfig,
    predictor::PredictorConfig,
    seasons::SeasonConfig,
    trading::TradingConfig,
    traits::ConfigSection,
};
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides, e.g. `EVOTRADE__EVOLUTION__POPULATION_SIZE=20`
pub const ENV_PREFIX: &str = "EVOTRADE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub trading: TradingConfig,
    pub predictor: PredictorConfig,
    pub seasons: SeasonConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EvotradeError> {
        self.evolution.validate()?;
        self.trading.validate()?;
        self.predictor.validate()?;
        self.seasons.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TOML or JSON file, layered under `EVOTRADE__*` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EvotradeError> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        self.config = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvotradeError> {
        let toml_str = toml::to_string_pretty(&self.config)?;

        std::fs::write(path, toml_str)
            .map_err(|e| EvotradeError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    pub fn update<F>(&mut self, f: F) -> Result<(), EvotradeError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.config.clone();
        f(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }
}
