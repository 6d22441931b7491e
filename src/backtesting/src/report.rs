use anyhow::{ensure, Result};
use chrono::NaiveDate;
use market_io::{ensure_parent_dir, write_file};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::models::{BacktestResult, PerformanceSummary};

#[derive(Serialize)]
struct JsonReport<'a> {
    result: &'a BacktestResult,
    performance: &'a PerformanceSummary,
}

fn write_metrics<W: Write>(
    out: &mut W,
    title: &str,
    metrics: &rustc_hash::FxHashMap<String, f64>,
) -> io::Result<()> {
    writeln!(out, "{}:", title)?;

    // Sort keys for consistent output
    let mut keys: Vec<&String> = metrics.keys().collect();
    keys.sort();

    for key in keys {
        writeln!(out, "  {}: {:.4}", key, metrics[key])?;
    }
    writeln!(out)?;
    Ok(())
}

/// Write the text report to any sink
pub fn write_text_report<W: Write>(
    out: &mut W,
    result: &BacktestResult,
    summary: &PerformanceSummary,
) -> io::Result<()> {
    writeln!(out, "Backtest Report")?;
    writeln!(out, "===============")?;
    writeln!(out)?;
    writeln!(out, "Rows: {}", result.len())?;
    writeln!(out, "Exposure: {:.2}%", 100.0 * result.exposure)?;
    writeln!(out)?;
    writeln!(out, "{:<12} {:>14} {:>14}", "", "Buy & Hold", "Strategy")?;
    writeln!(out, "{}", "-".repeat(42))?;
    writeln!(
        out,
        "{:<12} {:>14.4} {:>14.4}",
        "Final equity", result.final_buy_hold_equity, result.final_strategy_equity
    )?;
    writeln!(
        out,
        "{:<12} {:>13.2}% {:>13.2}%",
        "Max drawdown",
        100.0 * result.buy_hold_max_drawdown,
        100.0 * result.strategy_max_drawdown
    )?;
    writeln!(out)?;

    write_metrics(out, "Strategy Metrics", &summary.strategy)?;
    write_metrics(out, "Buy & Hold Metrics", &summary.buy_hold)?;
    Ok(())
}

/// Render the text report into a string
pub fn render_text_report(result: &BacktestResult, summary: &PerformanceSummary) -> Result<String> {
    let mut buf = Vec::new();
    write_text_report(&mut buf, result, summary)?;
    Ok(String::from_utf8(buf)?)
}

/// Generate a text report
pub fn generate_text_report<P: AsRef<Path>>(
    result: &BacktestResult,
    summary: &PerformanceSummary,
    path: P,
) -> Result<()> {
    ensure_parent_dir(&path)?;
    let mut file = BufWriter::new(File::create(path.as_ref())?);
    write_text_report(&mut file, result, summary)?;
    file.flush()?;
    Ok(())
}

/// Generate a JSON report
pub fn generate_json_report<P: AsRef<Path>>(
    result: &BacktestResult,
    summary: &PerformanceSummary,
    path: P,
) -> Result<()> {
    let report = JsonReport {
        result,
        performance: summary,
    };
    write_file(path, serde_json::to_vec_pretty(&report)?)?;
    Ok(())
}

/// Write both equity curves as CSV for charting
pub fn write_equity_csv<P: AsRef<Path>>(
    path: P,
    dates: &[NaiveDate],
    result: &BacktestResult,
) -> Result<()> {
    ensure!(
        dates.len() == result.len(),
        "{} dates for {} backtest rows",
        dates.len(),
        result.len()
    );
    ensure_parent_dir(&path)?;

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record([
        "Date",
        "Return",
        "Signal",
        "Position",
        "Strategy_Return",
        "BuyHold_Equity",
        "Strategy_Equity",
    ])?;

    for (i, row) in result.rows.iter().enumerate() {
        writer.write_record([
            dates[i].format("%Y-%m-%d").to_string(),
            row.ret.to_string(),
            row.signal.to_string(),
            row.position.to_string(),
            row.strategy_return.to_string(),
            result.buy_hold_equity[i].to_string(),
            result.strategy_equity[i].to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{run_backtest, summarize};
    use tempfile::tempdir;

    fn sample() -> (BacktestResult, PerformanceSummary) {
        let result = run_backtest(&[0.01, -0.02, 0.03], &[1, 1, 0]).unwrap();
        let summary = summarize(&result, 0.0);
        (result, summary)
    }

    #[test]
    fn test_text_report_lists_metrics() {
        let (result, summary) = sample();
        let text = render_text_report(&result, &summary).unwrap();

        assert!(text.contains("Final equity"));
        assert!(text.contains("Strategy Metrics:"));
        assert!(text.contains("Sharpe Ratio"));
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_text_report_surfaces_write_errors() {
        let (result, summary) = sample();
        let err = write_text_report(&mut BrokenSink, &result, &summary).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_text_report_file_matches_render() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/report.txt");
        let (result, summary) = sample();

        generate_text_report(&result, &summary, &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            render_text_report(&result, &summary).unwrap()
        );
    }

    #[test]
    fn test_json_report_round_trips_result() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        let (result, summary) = sample();

        generate_json_report(&result, &summary, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["result"]["rows"].as_array().unwrap().len(), 3);
        assert!(value["performance"]["strategy"]["Total Return"].is_number());
    }

    #[test]
    fn test_equity_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("equity.csv");
        let (result, _) = sample();
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let dates: Vec<NaiveDate> = start.iter_days().take(3).collect();

        write_equity_csv(&path, &dates, &result).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date,Return,Signal,Position"));
        assert!(lines[1].starts_with("2024-05-01,0.01,1,0,0,"));

        assert!(write_equity_csv(&path, &dates[..2], &result).is_err());
    }
}
