use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InputError;

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Column-oriented OHLCV history for a single instrument.
///
/// Construction guarantees equal column lengths, strictly increasing dates,
/// positive closes and finite values in every price and volume column.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        dates: Vec<NaiveDate>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self, InputError> {
        if dates.is_empty() {
            return Err(InputError::Empty);
        }
        if close.is_empty() {
            return Err(InputError::MissingColumn("Close".to_string()));
        }

        let expected = dates.len();
        for (name, column) in [
            ("Open", &open),
            ("High", &high),
            ("Low", &low),
            ("Close", &close),
            ("Volume", &volume),
        ] {
            if column.len() != expected {
                return Err(InputError::LengthMismatch {
                    column: name.to_string(),
                    expected,
                    actual: column.len(),
                });
            }
        }

        if let Some(row) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(InputError::NotAscending { row: row + 1 });
        }

        if let Some((row, &value)) = close
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_finite() || **c <= 0.0)
        {
            return Err(InputError::InvalidPrice { row, value });
        }

        for (name, column) in [
            ("Open", &open),
            ("High", &high),
            ("Low", &low),
            ("Volume", &volume),
        ] {
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(InputError::NonFiniteValue {
                    column: name.to_string(),
                    row,
                });
            }
        }

        Ok(Self {
            dates,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn from_bars(bars: &[PriceBar]) -> Result<Self, InputError> {
        Self::new(
            bars.iter().map(|b| b.date).collect(),
            bars.iter().map(|b| b.open).collect(),
            bars.iter().map(|b| b.high).collect(),
            bars.iter().map(|b| b.low).collect(),
            bars.iter().map(|b| b.close).collect(),
            bars.iter().map(|b| b.volume).collect(),
        )
    }

    /// Build a series from closes only, one bar per consecutive calendar day.
    /// Open/High/Low mirror the close and volume is zero.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, InputError> {
        let dates = start.iter_days().take(closes.len()).collect();
        Self::new(
            dates,
            closes.to_vec(),
            closes.to_vec(),
            closes.to_vec(),
            closes.to_vec(),
            vec![0.0; closes.len()],
        )
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

}

/// Column positions resolved from a CSV header row
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, InputError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        Ok(Self {
            date: find(&["date", "datetime", "timestamp"])
                .ok_or_else(|| InputError::MissingColumn("Date".to_string()))?,
            close: find(&["close"])
                .ok_or_else(|| InputError::MissingColumn("Close".to_string()))?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            volume: find(&["volume"]),
        })
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty()
        || cell.eq_ignore_ascii_case("nan")
        || cell.eq_ignore_ascii_case("null")
        || cell.eq_ignore_ascii_case("na")
}

/// Accepts YYYY-MM-DD, YYYYMMDD, "YYYY-MM-DD HH:MM:SS" and RFC 3339.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn parse_number(cell: &str, line: usize, column: &str) -> Result<f64, InputError> {
    cell.parse::<f64>().map_err(|_| InputError::Parse {
        line,
        message: format!("invalid {} value '{}'", column, cell),
    })
}

/// Read an OHLCV CSV file with a header row.
///
/// `Date` and `Close` are required; `Open`/`High`/`Low` fall back to the
/// close and `Volume` to zero when the column is absent. Rows with an empty
/// or NaN cell in any present column are dropped, and an empty result is an
/// error.
pub fn read_ohlcv_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path.as_ref())?;

    let columns = Columns::resolve(reader.headers()?)?;
    let mut bars = Vec::new();
    let mut dropped = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let present = [
            Some(columns.date),
            Some(columns.close),
            columns.open,
            columns.high,
            columns.low,
            columns.volume,
        ];
        if present.iter().flatten().any(|&idx| is_missing(cell(idx))) {
            dropped += 1;
            debug!(line, "dropping row with missing values");
            continue;
        }

        let date = parse_date(cell(columns.date)).ok_or_else(|| InputError::Parse {
            line,
            message: format!("invalid date '{}'", cell(columns.date)),
        })?;
        let close = parse_number(cell(columns.close), line, "Close")?;
        let optional = |idx: Option<usize>, name: &str, fallback: f64| match idx {
            Some(idx) => parse_number(cell(idx), line, name),
            None => Ok(fallback),
        };

        bars.push(PriceBar {
            date,
            open: optional(columns.open, "Open", close)?,
            high: optional(columns.high, "High", close)?,
            low: optional(columns.low, "Low", close)?,
            close,
            volume: optional(columns.volume, "Volume", 0.0)?,
        });
    }

    if dropped > 0 {
        warn!(dropped, "dropped rows with missing values");
    }
    if bars.is_empty() {
        return Err(InputError::Empty);
    }

    debug!(rows = bars.len(), path = %path.as_ref().display(), "loaded price history");
    PriceSeries::from_bars(&bars)
}
