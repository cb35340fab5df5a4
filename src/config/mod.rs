pub mod traits;
pub mod evolution;
pub mod trading;
pub mod predictor;
pub mod seasons;
pub mod output;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::EvolutionConfig;
pub use trading::TradingConfig;
pub use predictor::PredictorConfig;
pub use seasons::SeasonConfig;
pub use output::OutputConfig;
