use super::traits::{section_error, ConfigSection};
use crate::engines::generation::selection::ZeroFitnessPolicy;
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub mutation_scale: f64,
    pub seed: Option<u64>,
    pub zero_fitness_policy: ZeroFitnessPolicy,
    /// Build a random population at construction time
    pub big_bang: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 150,
            mutation_rate: 0.05,
            mutation_scale: 0.3,
            seed: None,
            zero_fitness_policy: ZeroFitnessPolicy::Uniform,
            big_bang: true,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        let name = Self::section_name();
        if self.population_size == 0 {
            return Err(section_error(name, "population_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(section_error(name, "mutation_rate must be between 0 and 1"));
        }
        if !self.mutation_scale.is_finite() || self.mutation_scale < 0.0 {
            return Err(section_error(name, "mutation_scale must be a non-negative number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_population() {
        let config = EvolutionConfig {
            population_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("population_size"));
    }

    #[test]
    fn test_rejects_mutation_rate_above_one() {
        let config = EvolutionConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
