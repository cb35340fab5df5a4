use crate::{
    error::{EvotradeError, Result},
    types::{CashSnapshot, Side, TradeRecord},
};
use std::io::Write;

const DUMP_COLUMN_WIDTH: usize = 26;
const DUMP_HEADERS: [&str; 5] = ["idx", "price", "cash_wallet", "percent_change", "units_wallet"];

/// Every price must be finite and strictly positive; `what` names the vector in the error.
pub fn check_prices(prices: &[f64], what: &str) -> Result<()> {
    if let Some((idx, price)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(EvotradeError::Configuration(format!(
            "{} for asset {} is {}; prices must be finite and positive",
            what, idx, price
        )));
    }
    Ok(())
}

/// Per-asset cash/holdings ledger.
///
/// Each asset is either entirely in cash or entirely in units; `is_holding`
/// tells which. Every buy and sell converts the whole balance.
#[derive(Debug, Clone)]
pub struct Wallet {
    pub trading_fee: f64,
    pub cash: Vec<f64>,
    pub holding_units: Vec<f64>,
    pub is_holding: Vec<bool>,
    pub entry_price: Vec<Option<f64>>,
    pub starting_cash: Vec<f64>,
    pub starting_price: Vec<f64>,
    old_cash: Vec<f64>,

    pub trade_history: Vec<TradeRecord>,
    pub cash_history: Vec<CashSnapshot>,
}

impl Wallet {
    pub fn new(starting_cash: Vec<f64>, starting_price: Vec<f64>, trading_fee: f64) -> Result<Self> {
        if starting_cash.is_empty() {
            return Err(EvotradeError::Configuration(
                "Wallet needs at least one asset".to_string(),
            ));
        }
        if starting_cash.len() != starting_price.len() {
            return Err(EvotradeError::Configuration(format!(
                "starting_cash has {} assets but starting_price has {}",
                starting_cash.len(),
                starting_price.len()
            )));
        }
        if let Some(idx) = starting_cash.iter().position(|c| c.is_nan() || *c <= 0.0) {
            return Err(EvotradeError::Configuration(format!(
                "starting_cash for asset {} must be positive",
                idx
            )));
        }
        check_prices(&starting_price, "starting_price")?;
        if !(0.0..1.0).contains(&trading_fee) {
            return Err(EvotradeError::Configuration(format!(
                "trading_fee {} must be in [0, 1)",
                trading_fee
            )));
        }

        let assets = starting_cash.len();
        Ok(Self {
            trading_fee,
            cash: starting_cash.clone(),
            holding_units: vec![0.0; assets],
            is_holding: vec![false; assets],
            entry_price: vec![None; assets],
            starting_cash,
            starting_price,
            old_cash: vec![0.0; assets],
            trade_history: Vec::new(),
            cash_history: Vec::new(),
        })
    }

    pub fn num_assets(&self) -> usize {
        self.cash.len()
    }

    fn check_index(&self, idx: usize) -> Result<()> {
        if idx >= self.num_assets() {
            return Err(EvotradeError::AssetIndex {
                index: idx,
                assets: self.num_assets(),
            });
        }
        Ok(())
    }

    /// Convert all cash of `idx` into units at `price`. No-op while already holding.
    pub fn buy(&mut self, idx: usize, price: f64) -> Result<()> {
        self.check_index(idx)?;
        if self.is_holding[idx] {
            return Ok(());
        }

        let cash = self.cash[idx];
        let units = cash / price * (1.0 - self.trading_fee);

        self.entry_price[idx] = Some(price);
        self.holding_units[idx] = units;
        self.cash_history.push(CashSnapshot { asset: idx, cash });
        self.trade_history.push(TradeRecord {
            asset: idx,
            side: Side::Buy,
            price,
            before: cash,
            after: units,
            units,
        });

        self.old_cash[idx] = cash;
        self.cash[idx] = 0.0;
        self.is_holding[idx] = true;

        Ok(())
    }

    /// Convert all units of `idx` back into cash at `price`. No-op while not holding.
    pub fn sell(&mut self, idx: usize, price: f64) -> Result<()> {
        self.check_index(idx)?;
        if !self.is_holding[idx] {
            return Ok(());
        }

        let units = self.holding_units[idx];
        let cash = units * price * (1.0 - self.trading_fee);

        self.cash[idx] = cash;
        self.cash_history.push(CashSnapshot { asset: idx, cash });
        self.trade_history.push(TradeRecord {
            asset: idx,
            side: Side::Sell,
            price,
            before: units,
            after: cash / self.old_cash[idx] * 100.0 - 100.0,
            units,
        });

        self.holding_units[idx] = 0.0;
        self.is_holding[idx] = false;

        Ok(())
    }

    /// Force-close any open position of `idx` at `price` and return the
    /// percent change of its cash against the starting cash.
    ///
    /// Not idempotent with an open position: call once per evaluation point.
    pub fn get_swing_earnings(&mut self, idx: usize, price: f64) -> Result<f64> {
        self.sell(idx, price)?;
        Ok(self.cash[idx] / self.starting_cash[idx] * 100.0 - 100.0)
    }

    /// Same figure as [`Wallet::get_swing_earnings`], valuing an open position
    /// at `price` net of the sell fee, without touching the ledger.
    pub fn earnings_at(&self, idx: usize, price: f64) -> Result<f64> {
        self.check_index(idx)?;
        let value = if self.is_holding[idx] {
            self.holding_units[idx] * price * (1.0 - self.trading_fee)
        } else {
            self.cash[idx]
        };
        Ok(value / self.starting_cash[idx] * 100.0 - 100.0)
    }

    /// Buy-and-hold benchmark against the last asset's starting price
    pub fn get_holding_earnings(&self, final_price: f64) -> f64 {
        let reference = self.starting_price.last().copied().unwrap_or(final_price);
        final_price / reference * 100.0 - 100.0
    }

    /// Write the trade ledger as fixed-width columns
    pub fn dump_trades<W: Write>(&self, sink: &mut W) -> Result<()> {
        for header in DUMP_HEADERS {
            write!(sink, "{:<width$}", header, width = DUMP_COLUMN_WIDTH)?;
        }
        writeln!(sink)?;

        for trade in &self.trade_history {
            for value in trade.columns() {
                write!(sink, "{:<width$}", format!("{:.6}", value), width = DUMP_COLUMN_WIDTH)?;
            }
            writeln!(sink)?;
        }

        Ok(())
    }

    pub fn get_trades(&self) -> &[TradeRecord] {
        &self.trade_history
    }
}
