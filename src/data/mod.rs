pub mod checkpoint;
pub mod connectors;
pub mod seasons;
pub mod source;

pub use checkpoint::Checkpoint;
pub use connectors::{CsvConnector, CsvMarketData};
pub use seasons::split_seasons;
pub use source::{MarketDataSource, StaticMarketData};
