mod csv;

pub use csv::{CsvConnector, CsvMarketData, ASSET_COLUMN, MAGNITUDE_COLUMN, PRICE_COLUMN};
