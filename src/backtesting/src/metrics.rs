use rustc_hash::FxHashMap;

use crate::models::{BacktestResult, PerformanceSummary};

pub const TOTAL_RETURN: &str = "Total Return";
pub const MEAN_DAILY_RETURN: &str = "Mean Daily Return";
pub const DAILY_VOLATILITY: &str = "Daily Volatility";
pub const ANNUALIZED_VOLATILITY: &str = "Annualized Volatility";
pub const SHARPE_RATIO: &str = "Sharpe Ratio";
pub const MAX_DRAWDOWN: &str = "Max Drawdown";

const TRADING_DAYS: f64 = 252.0;

/// Running product of (1 + r), seeded at 1.0. One value per return.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |equity, r| {
            *equity *= 1.0 + r;
            Some(*equity)
        })
        .collect()
}

/// Worst value of `equity[t] / max(1.0, equity[..=t]) - 1`.
///
/// The curve is taken to start from the 1.0 seed, so a loss on the first
/// row counts. Never positive; zero for an empty curve or one that never
/// falls below its running peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;

    for &value in equity {
        peak = peak.max(value);
        worst = worst.min(value / peak - 1.0);
    }

    worst
}

/// Calculate performance metrics for a daily return stream
pub fn calculate_metrics(daily_returns: &[f64], risk_free_rate: f64) -> FxHashMap<String, f64> {
    let mut metrics = FxHashMap::default();
    let n = daily_returns.len();

    if n == 0 {
        return metrics;
    }

    let curve = equity_curve(daily_returns);
    metrics.insert(TOTAL_RETURN.to_string(), curve[n - 1] - 1.0);

    let mean_return = daily_returns.iter().sum::<f64>() / n as f64;
    metrics.insert(MEAN_DAILY_RETURN.to_string(), mean_return);

    let volatility = sample_std(daily_returns, mean_return);
    metrics.insert(DAILY_VOLATILITY.to_string(), volatility);
    metrics.insert(
        ANNUALIZED_VOLATILITY.to_string(),
        volatility * TRADING_DAYS.sqrt(),
    );

    // annual risk-free rate compounded down to one trading day
    let daily_rf = (1.0 + risk_free_rate).powf(1.0 / TRADING_DAYS) - 1.0;
    let excess: Vec<f64> = daily_returns.iter().map(|r| r - daily_rf).collect();
    let mean_excess = excess.iter().sum::<f64>() / n as f64;
    let std_excess = sample_std(&excess, mean_excess);

    let sharpe = if std_excess > 1e-9 {
        mean_excess / std_excess * TRADING_DAYS.sqrt()
    } else {
        0.0
    };
    metrics.insert(SHARPE_RATIO.to_string(), sharpe);
    metrics.insert(MAX_DRAWDOWN.to_string(), max_drawdown(&curve));

    metrics
}

/// Metrics for both the strategy and the buy-and-hold baseline.
pub fn summarize(result: &BacktestResult, risk_free_rate: f64) -> PerformanceSummary {
    PerformanceSummary {
        strategy: calculate_metrics(&result.strategy_returns(), risk_free_rate),
        buy_hold: calculate_metrics(&result.returns(), risk_free_rate),
    }
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
