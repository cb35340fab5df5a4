use crate::{
    data::source::MarketDataSource,
    error::{EvotradeError, Result},
    types::Event,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub const ASSET_COLUMN: &str = "asset";
pub const MAGNITUDE_COLUMN: &str = "magnitude";
pub const PRICE_COLUMN: &str = "price";

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| EvotradeError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Event feed with `asset` and `magnitude` columns, in feed order
    pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
        let df = Self::load(path)?;
        Self::events_from_frame(&df)
    }

    /// Price vector from a `price` column; row `i` is asset `i`
    pub fn load_prices<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
        let df = Self::load(path)?;
        Self::prices_from_frame(&df)
    }

    pub fn events_from_frame(df: &DataFrame) -> Result<Vec<Event>> {
        let assets = df.column(ASSET_COLUMN)?.cast(&DataType::Int64)?;
        let magnitudes = df.column(MAGNITUDE_COLUMN)?.cast(&DataType::Float64)?;

        assets
            .i64()?
            .into_iter()
            .zip(magnitudes.f64()?.into_iter())
            .enumerate()
            .map(|(row, pair)| match pair {
                (Some(asset), Some(magnitude)) if asset >= 0 => {
                    Ok(Event::new(asset as usize, magnitude))
                }
                (Some(asset), Some(_)) => Err(EvotradeError::DataLoading(format!(
                    "Row {}: negative asset index {}",
                    row, asset
                ))),
                _ => Err(EvotradeError::DataLoading(format!(
                    "Row {}: missing asset or magnitude",
                    row
                ))),
            })
            .collect()
    }

    pub fn prices_from_frame(df: &DataFrame) -> Result<Vec<f64>> {
        let prices = df.column(PRICE_COLUMN)?.cast(&DataType::Float64)?;

        let prices: Vec<f64> = prices
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, price)| match price {
                Some(p) if p > 0.0 => Ok(p),
                Some(p) => Err(EvotradeError::DataLoading(format!(
                    "Row {}: price {} must be positive",
                    row, p
                ))),
                None => Err(EvotradeError::DataLoading(format!("Row {}: missing price", row))),
            })
            .collect::<Result<_>>()?;

        if prices.is_empty() {
            return Err(EvotradeError::DataLoading("Price file has no rows".to_string()));
        }
        Ok(prices)
    }
}

/// Reference prices read from a CSV file on demand
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    prices_path: PathBuf,
}

impl CsvMarketData {
    pub fn new<P: Into<PathBuf>>(prices_path: P) -> Self {
        Self {
            prices_path: prices_path.into(),
        }
    }
}

impl MarketDataSource for CsvMarketData {
    fn starting_prices(&self) -> Result<Vec<f64>> {
        let prices = CsvConnector::load_prices(&self.prices_path)?;
        log::info!(
            "Loaded {} starting prices from {}",
            prices.len(),
            self.prices_path.display()
        );
        Ok(prices)
    }
}
