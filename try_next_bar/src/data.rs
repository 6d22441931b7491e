use std::path::Path;

use anyhow::{Context, Result};
use market_io::{read_ohlcv_csv, PriceSeries};
use tracing::info;

/// Load an OHLCV CSV file, dropping rows with missing cells
pub fn load_prices<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let path = path.as_ref();
    let prices = read_ohlcv_csv(path)
        .with_context(|| format!("failed to load prices from {}", path.display()))?;

    if let (Some(first), Some(last)) = (prices.dates().first(), prices.dates().last()) {
        info!(bars = prices.len(), %first, %last, "prices loaded");
    }
    Ok(prices)
}
