use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One test-split row as the strategy sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Model classification for this row: 1 = expect the next bar up.
    pub signal: u8,
    /// Signal of the previous row; 0 on the first row.
    pub position: u8,
    /// Realized close-to-close return of this row.
    pub ret: f64,
    /// position * ret
    pub strategy_return: f64,
}

/// Equity curves and drawdowns for the strategy and the always-long baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Per-row signals, positions and returns.
    pub rows: Vec<TradeSignal>,
    /// Running product of (1 + return), one value per row.
    pub buy_hold_equity: Vec<f64>,
    /// Running product of (1 + strategy return), one value per row.
    pub strategy_equity: Vec<f64>,
    pub final_buy_hold_equity: f64,
    pub final_strategy_equity: f64,
    /// Worst peak-to-trough decline as a fraction (<= 0).
    pub buy_hold_max_drawdown: f64,
    /// Worst peak-to-trough decline as a fraction (<= 0).
    pub strategy_max_drawdown: f64,
    /// Fraction of rows with an open position.
    pub exposure: f64,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.strategy_return).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.ret).collect()
    }
}

/// Keyed performance metrics for both return streams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub strategy: FxHashMap<String, f64>,
    pub buy_hold: FxHashMap<String, f64>,
}
