use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvotradeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Asset index {index} out of range for {assets} assets")]
    AssetIndex { index: usize, assets: usize },

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Every fitness value is zero in generation {generation}; selection is undefined")]
    ZeroFitnessSum { generation: usize },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, EvotradeError>;
