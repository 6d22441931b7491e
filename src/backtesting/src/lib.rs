pub mod core;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;

pub use crate::core::run_backtest;
pub use error::BacktestError;
pub use metrics::{calculate_metrics, equity_curve, max_drawdown, summarize};
pub use models::{BacktestResult, PerformanceSummary, TradeSignal};
