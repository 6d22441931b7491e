use tracing::{debug, info};

use crate::error::BacktestError;
use crate::metrics::{equity_curve, max_drawdown};
use crate::models::{BacktestResult, TradeSignal};

/// Backtest a long/flat strategy driven by per-row 0/1 signals.
///
/// A signal observed on row `t` is acted on from row `t + 1`, so the
/// position on row `t` is the previous row's signal and the first row is
/// always flat. The strategy earns `position * return` per row; the baseline
/// holds throughout.
///
/// # Arguments
/// * `returns` - Realized close-to-close returns of the evaluated rows
/// * `signals` - Model classification for the same rows (0 or 1)
pub fn run_backtest(returns: &[f64], signals: &[u8]) -> Result<BacktestResult, BacktestError> {
    if returns.len() != signals.len() {
        return Err(BacktestError::LengthMismatch {
            returns: returns.len(),
            signals: signals.len(),
        });
    }
    if returns.is_empty() {
        return Err(BacktestError::EmptySeries);
    }
    if let Some((row, &value)) = signals.iter().enumerate().find(|(_, s)| **s > 1) {
        return Err(BacktestError::InvalidSignal { row, value });
    }
    if let Some(row) = returns.iter().position(|r| !r.is_finite()) {
        return Err(BacktestError::NonFiniteReturn { row });
    }

    let positions = std::iter::once(0).chain(signals.iter().copied());
    let rows: Vec<TradeSignal> = returns
        .iter()
        .zip(signals)
        .zip(positions)
        .map(|((&ret, &signal), position)| TradeSignal {
            signal,
            position,
            ret,
            strategy_return: f64::from(position) * ret,
        })
        .collect();

    let strategy_returns: Vec<f64> = rows.iter().map(|r| r.strategy_return).collect();
    let buy_hold_equity = equity_curve(returns);
    let strategy_equity = equity_curve(&strategy_returns);

    let in_market = rows.iter().filter(|r| r.position == 1).count();
    let exposure = in_market as f64 / rows.len() as f64;
    debug!(rows = rows.len(), in_market, "positions derived");

    let result = BacktestResult {
        final_buy_hold_equity: buy_hold_equity[buy_hold_equity.len() - 1],
        final_strategy_equity: strategy_equity[strategy_equity.len() - 1],
        buy_hold_max_drawdown: max_drawdown(&buy_hold_equity),
        strategy_max_drawdown: max_drawdown(&strategy_equity),
        exposure,
        rows,
        buy_hold_equity,
        strategy_equity,
    };

    info!(
        buy_hold = result.final_buy_hold_equity,
        strategy = result.final_strategy_equity,
        "backtest completed"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_position_is_flat() {
        let result = run_backtest(&[0.05, 0.01, -0.02], &[1, 1, 1]).unwrap();

        assert_eq!(result.rows[0].position, 0);
        assert_eq!(result.rows[0].strategy_return, 0.0);
        assert_eq!(result.rows[1].position, 1);
        assert_eq!(result.rows[2].position, 1);
    }

    #[test]
    fn test_shift_by_one() {
        let returns = [0.02, -0.01, 0.03, -0.04, 0.01];
        let signals = [0, 1, 1, 0, 1];
        let result = run_backtest(&returns, &signals).unwrap();

        let positions: Vec<u8> = result.rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 0, 1, 1, 0]);

        // in market on rows 2 and 3 only
        let expected = (1.0 + 0.03) * (1.0 - 0.04);
        assert!((result.final_strategy_equity - expected).abs() < 1e-12);

        let buy_hold: f64 = returns.iter().map(|r| 1.0 + r).product();
        assert!((result.final_buy_hold_equity - buy_hold).abs() < 1e-12);
        assert!((result.exposure - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_always_flat_keeps_unit_equity() {
        let result = run_backtest(&[0.1, -0.3, 0.2], &[0, 0, 0]).unwrap();

        assert!(result.strategy_equity.iter().all(|&e| e == 1.0));
        assert_eq!(result.strategy_max_drawdown, 0.0);
        assert!(result.buy_hold_max_drawdown < 0.0);
    }

    #[test]
    fn test_drawdowns_never_positive() {
        let returns = [0.03, -0.05, 0.02, 0.04, -0.01, -0.02, 0.06];
        let signals = [1, 0, 1, 1, 1, 0, 1];
        let result = run_backtest(&returns, &signals).unwrap();

        assert!(result.buy_hold_max_drawdown <= 0.0);
        assert!(result.strategy_max_drawdown <= 0.0);
        assert_eq!(result.buy_hold_equity.len(), returns.len());
        assert_eq!(result.strategy_equity.len(), returns.len());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            run_backtest(&[0.1], &[1, 0]),
            Err(BacktestError::LengthMismatch { returns: 1, signals: 2 })
        ));
        assert!(matches!(run_backtest(&[], &[]), Err(BacktestError::EmptySeries)));
        assert!(matches!(
            run_backtest(&[0.1, 0.2], &[0, 2]),
            Err(BacktestError::InvalidSignal { row: 1, value: 2 })
        ));
        assert!(matches!(
            run_backtest(&[0.1, f64::NAN], &[0, 1]),
            Err(BacktestError::NonFiniteReturn { row: 1 })
        ));
    }
}
