//! End-to-end run: features, fit, latest signal and a backtest of the
//! test-split signals.

use backtesting::{run_backtest, summarize, BacktestResult, PerformanceSummary};
use chrono::NaiveDate;
use market_io::PriceSeries;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::features::{build_feature_set, FEATURE_COLUMNS};
use crate::models::{ClassifierParams, FitReport, ModelWrapper};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub feature_columns: Vec<String>,
    pub train_ratio: f64,
    pub classifier: ClassifierParams,
    /// Annual rate used for the Sharpe ratio
    pub risk_free_rate: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            train_ratio: 0.7,
            classifier: ClassifierParams::default(),
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub classifier: String,
    pub n_prices: usize,
    pub n_feature_rows: usize,
    pub fit: FitReport,
    pub latest_signal: u8,
    pub latest_date: NaiveDate,
    pub test_dates: Vec<NaiveDate>,
    pub backtest: BacktestResult,
    pub performance: PerformanceSummary,
}

pub fn run_pipeline(prices: &PriceSeries, config: &PipelineConfig) -> Result<PipelineReport> {
    let table = build_feature_set(prices)?;
    info!(prices = prices.len(), rows = table.len(), "features ready");

    let mut model = ModelWrapper::new(
        &config.feature_columns,
        config.train_ratio,
        config.classifier.build(),
    )?;
    let fit = model.fit(&table)?;

    let latest_signal = model.predict_latest(&table)?;
    let latest_date = table.dates()[table.len() - 1];

    let signals = model.predict_test(&table)?;
    let test = fit.split_index..table.len();
    let backtest = run_backtest(&table.returns()[test.clone()], &signals)?;
    let performance = summarize(&backtest, config.risk_free_rate);

    info!(
        final_strategy_equity = backtest.final_strategy_equity,
        final_buy_hold_equity = backtest.final_buy_hold_equity,
        "backtest complete"
    );

    Ok(PipelineReport {
        classifier: model.classifier_name().to_string(),
        n_prices: prices.len(),
        n_feature_rows: table.len(),
        fit,
        latest_signal,
        latest_date,
        test_dates: table.dates()[test].to_vec(),
        backtest,
        performance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::ClassifierKind;

    fn prices(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let closes: Vec<f64> = (0..n)
            .map(|i| 50.0 * (1.0 + 0.02 * (i as f64 * 0.45).sin()) + i as f64 * 0.03)
            .collect();
        PriceSeries::from_closes(start, &closes).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.feature_columns,
            vec!["Close", "SMA_5", "SMA_20", "Vol_10", "RSI_14"]
        );
        assert_eq!(config.train_ratio, 0.7);
        assert_eq!(config.classifier.kind, ClassifierKind::Forest);
    }

    #[test]
    fn test_pipeline_shapes() {
        let prices = prices(150);
        let config = PipelineConfig {
            classifier: ClassifierParams {
                n_trees: 10,
                ..ClassifierParams::default()
            },
            ..PipelineConfig::default()
        };
        let report = run_pipeline(&prices, &config).unwrap();

        assert_eq!(report.n_feature_rows, 130);
        assert_eq!(report.fit.split_index, 91);
        assert_eq!(report.backtest.len(), report.fit.n_test);
        assert_eq!(report.test_dates.len(), report.fit.n_test);
        assert_eq!(report.latest_date, prices.dates()[148]);
        assert!(report.latest_signal <= 1);
        assert_eq!(report.backtest.rows[0].position, 0);
        assert!(report.backtest.strategy_max_drawdown <= 0.0);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let prices = prices(90);
        let config = PipelineConfig::default();
        let a = run_pipeline(&prices, &config).unwrap();
        let b = run_pipeline(&prices, &config).unwrap();

        assert_eq!(a.latest_signal, b.latest_signal);
        assert_eq!(a.backtest.strategy_equity, b.backtest.strategy_equity);
    }

    #[test]
    fn test_pipeline_propagates_input_errors() {
        let config = PipelineConfig::default();
        assert!(matches!(
            run_pipeline(&prices(20), &config),
            Err(Error::Input(_))
        ));
    }
}
