use serde::{Deserialize, Serialize};

/// One input from the feed: a magnitude observed on a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub asset: usize,
    pub magnitude: f64,
}

impl Event {
    pub fn new(asset: usize, magnitude: f64) -> Self {
        Self { asset, magnitude }
    }
}

/// Discrete trade action decoded from a predictor output row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Sleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Ledger entry written by the wallet on every executed trade.
///
/// For a buy, `before` is the cash spent and `after` the units received.
/// For a sell, `before` is the units sold and `after` the percent change
/// against the cash committed by the matching buy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub asset: usize,
    pub side: Side,
    pub price: f64,
    pub before: f64,
    pub after: f64,
    pub units: f64,
}

impl TradeRecord {
    pub fn columns(&self) -> [f64; 5] {
        [self.asset as f64, self.price, self.before, self.after, self.units]
    }
}

/// Cash balance of one asset observed around a trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashSnapshot {
    pub asset: usize,
    pub cash: f64,
}
