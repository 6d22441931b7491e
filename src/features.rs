//! Feature engineering: returns, moving averages, volatility, RSI and the
//! next-bar direction target.

use std::ops::Range;

use chrono::NaiveDate;
use indicators::{moving_average, rolling_std, rsi_sma};
use market_io::{pct_change, InputError, PriceSeries};
use serde::Serialize;
use tracing::debug;

pub const SMA_SHORT: usize = 5;
pub const SMA_LONG: usize = 20;
pub const VOL_WINDOW: usize = 10;
pub const RSI_PERIOD: usize = 14;

/// Smallest price history that yields one feature row: the longest window
/// plus the bar that supplies the final target.
pub const MIN_ROWS: usize = SMA_LONG + 1;

/// Columns selectable as model inputs.
pub const COLUMN_NAMES: [&str; 10] = [
    "Open", "High", "Low", "Close", "Volume", "Return", "SMA_5", "SMA_20", "Vol_10", "RSI_14",
];

/// Default model inputs.
pub const FEATURE_COLUMNS: [&str; 5] = ["Close", "SMA_5", "SMA_20", "Vol_10", "RSI_14"];

/// One fully defined row of the feature table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ret: f64,
    pub sma_5: f64,
    pub sma_20: f64,
    pub vol_10: f64,
    pub rsi_14: f64,
    /// 1 if the next bar's return is strictly positive
    pub target: u8,
}

/// Price columns plus derived features, restricted to rows where every
/// value and the target are defined. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    ret: Vec<f64>,
    sma_5: Vec<f64>,
    sma_20: Vec<f64>,
    vol_10: Vec<f64>,
    rsi_14: Vec<f64>,
    target: Vec<u8>,
}

impl FeatureTable {
    fn push(&mut self, row: FeatureRow) {
        self.dates.push(row.date);
        self.open.push(row.open);
        self.high.push(row.high);
        self.low.push(row.low);
        self.close.push(row.close);
        self.volume.push(row.volume);
        self.ret.push(row.ret);
        self.sma_5.push(row.sma_5);
        self.sma_20.push(row.sma_20);
        self.vol_10.push(row.vol_10);
        self.rsi_14.push(row.rsi_14);
        self.target.push(row.target);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn returns(&self) -> &[f64] {
        &self.ret
    }

    pub fn targets(&self) -> &[u8] {
        &self.target
    }

    /// Look up a numeric column by its name in [`COLUMN_NAMES`].
    pub fn column(&self, name: &str) -> Result<&[f64], InputError> {
        let column = match name {
            "Open" => &self.open,
            "High" => &self.high,
            "Low" => &self.low,
            "Close" => &self.close,
            "Volume" => &self.volume,
            "Return" => &self.ret,
            "SMA_5" => &self.sma_5,
            "SMA_20" => &self.sma_20,
            "Vol_10" => &self.vol_10,
            "RSI_14" => &self.rsi_14,
            _ => return Err(InputError::UnknownColumn(name.to_string())),
        };
        Ok(column)
    }

    pub fn row(&self, i: usize) -> Option<FeatureRow> {
        (i < self.len()).then(|| FeatureRow {
            date: self.dates[i],
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume[i],
            ret: self.ret[i],
            sma_5: self.sma_5[i],
            sma_20: self.sma_20[i],
            vol_10: self.vol_10[i],
            rsi_14: self.rsi_14[i],
            target: self.target[i],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = FeatureRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// Row-major matrix of `columns` over `rows`:
    /// `[row0_col0, row0_col1, ..., row1_col0, ...]`.
    pub fn design_matrix<S: AsRef<str>>(
        &self,
        columns: &[S],
        rows: Range<usize>,
    ) -> Result<Vec<f64>, InputError> {
        if rows.end > self.len() {
            return Err(InputError::TooFewRows {
                required: rows.end,
                actual: self.len(),
            });
        }

        let selected = columns
            .iter()
            .map(|c| self.column(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut data = Vec::with_capacity(rows.len() * selected.len());
        for i in rows {
            data.extend(selected.iter().map(|col| col[i]));
        }
        Ok(data)
    }
}

/// Derive the feature table from a price history.
///
/// Adds Return, SMA_5, SMA_20, Vol_10, RSI_14 and Target, then drops every
/// row with an incomplete window plus the final row, whose target would need
/// a bar that does not exist yet. The result has `prices.len() - 20` rows.
pub fn build_feature_set(prices: &PriceSeries) -> Result<FeatureTable, InputError> {
    let n = prices.len();
    if n < MIN_ROWS {
        return Err(InputError::TooFewRows {
            required: MIN_ROWS,
            actual: n,
        });
    }

    let close = prices.close();
    let ret = pct_change(close);
    let sma_5 = moving_average(close, SMA_SHORT);
    let sma_20 = moving_average(close, SMA_LONG);
    let vol_10 = rolling_std(&ret, VOL_WINDOW);
    let rsi_14 = rsi_sma(close, RSI_PERIOD);

    let mut table = FeatureTable::default();

    // the last bar has no next return, so no target
    for t in 0..n - 1 {
        let derived = [ret[t], sma_5[t], sma_20[t], vol_10[t], rsi_14[t]];
        if derived.iter().any(|v| v.is_nan()) {
            continue;
        }

        table.push(FeatureRow {
            date: prices.dates()[t],
            open: prices.open()[t],
            high: prices.high()[t],
            low: prices.low()[t],
            close: close[t],
            volume: prices.volume()[t],
            ret: ret[t],
            sma_5: sma_5[t],
            sma_20: sma_20[t],
            vol_10: vol_10[t],
            rsi_14: rsi_14[t],
            target: u8::from(ret[t + 1] > 0.0),
        });
    }

    debug!(
        prices = n,
        rows = table.len(),
        dropped = n - table.len(),
        "feature table built"
    );

    Ok(table)
}
