use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backtesting::metrics::SHARPE_RATIO;
use backtesting::report::{generate_json_report, generate_text_report, write_equity_csv};
use nextbar::PipelineReport;
use tracing::info;

use crate::config::Config;

pub const TEXT_REPORT: &str = "backtest_report.txt";
pub const JSON_REPORT: &str = "backtest_report.json";
pub const EQUITY_CSV: &str = "equity_curve.csv";

/// Console wording for a 0/1 signal
pub fn signal_label(signal: u8) -> &'static str {
    if signal == 1 { "BUY/LONG" } else { "FLAT / NO-LONG" }
}

/// Print the run summary to stdout
pub fn print_summary(config: &Config, report: &PipelineReport) {
    let bt = &report.backtest;

    println!("\n{}", "=".repeat(60));
    println!("Summary: {}", config.symbol);
    println!("{}", "=".repeat(60));
    println!("\nData:");
    println!("  Price bars: {}", report.n_prices);
    println!("  Feature rows: {}", report.n_feature_rows);
    println!("  Features: {}", config.feature_columns.join(", "));
    println!(
        "  Train / test rows: {} / {}",
        report.fit.n_train, report.fit.n_test
    );

    println!("\nModel Performance ({}):", report.classifier);
    println!("  Train accuracy: {:.3}", report.fit.train_accuracy);
    println!("  Test accuracy: {:.3}", report.fit.test_accuracy);

    println!(
        "\nLatest signal ({}): {}",
        report.latest_date,
        signal_label(report.latest_signal)
    );

    println!("\nBacktest Performance (test split):");
    println!(
        "  Buy & hold final equity: {:.4}",
        bt.final_buy_hold_equity
    );
    println!("  Strategy final equity: {:.4}", bt.final_strategy_equity);
    println!(
        "  Buy & hold max drawdown: {:.2}%",
        100.0 * bt.buy_hold_max_drawdown
    );
    println!(
        "  Strategy max drawdown: {:.2}%",
        100.0 * bt.strategy_max_drawdown
    );
    println!("  Exposure: {:.2}%", 100.0 * bt.exposure);
    if let Some(sharpe) = report.performance.strategy.get(SHARPE_RATIO) {
        println!("  Strategy Sharpe ratio: {:.3}", sharpe);
    }
}

/// Write the text and JSON backtest reports plus the equity curve CSV
/// into `output_dir`, returning the written paths.
pub fn write_reports<P: AsRef<Path>>(output_dir: P, report: &PipelineReport) -> Result<Vec<PathBuf>> {
    let dir = output_dir.as_ref();
    let text = dir.join(TEXT_REPORT);
    let json = dir.join(JSON_REPORT);
    let equity = dir.join(EQUITY_CSV);

    generate_text_report(&report.backtest, &report.performance, &text)
        .with_context(|| format!("failed to write {}", text.display()))?;
    generate_json_report(&report.backtest, &report.performance, &json)
        .with_context(|| format!("failed to write {}", json.display()))?;
    write_equity_csv(&equity, &report.test_dates, &report.backtest)
        .with_context(|| format!("failed to write {}", equity.display()))?;

    info!(dir = %dir.display(), "reports written");
    Ok(vec![text, json, equity])
}
