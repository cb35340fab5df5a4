use crate::engines::evaluation::check_prices;
use crate::error::{EvotradeError, Result};

/// Supplies the reference prices a population's wallets start from.
///
/// Passed explicitly into population construction; nothing in the crate
/// reaches for a global market client.
pub trait MarketDataSource {
    fn starting_prices(&self) -> Result<Vec<f64>>;
}

/// Prices known up front
#[derive(Debug, Clone)]
pub struct StaticMarketData {
    prices: Vec<f64>,
}

impl StaticMarketData {
    pub fn new(prices: Vec<f64>) -> Self {
        Self { prices }
    }
}

impl MarketDataSource for StaticMarketData {
    fn starting_prices(&self) -> Result<Vec<f64>> {
        if self.prices.is_empty() {
            return Err(EvotradeError::DataLoading("No starting prices".to_string()));
        }
        check_prices(&self.prices, "starting price")?;
        Ok(self.prices.clone())
    }
}
