use crate::window::{mean, rolling};

/// Relative Strength Index using simple rolling means of gains and losses.
///
/// - delta[t] = price[t] - price[t-1]
/// - gain = max(delta, 0), loss = max(-delta, 0)
/// - avg gain / avg loss = mean over the last `period` deltas
/// - RSI = 100 - 100 / (1 + avg_gain / avg_loss)
///
/// When the average loss is exactly zero the RSI is 100, including a
/// window with no movement at all.
///
/// # Returns
///
/// A Vec<f64> aligned with `prices`; the first `period` values are NaN.
pub fn rsi_sma(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];

    for t in 1..n {
        let delta = prices[t] - prices[t - 1];
        gains[t] = delta.max(0.0);
        losses[t] = (-delta).max(0.0);
    }

    let avg_gain = rolling(&gains, period, mean);
    let avg_loss = rolling(&losses, period, mean);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| {
            if g.is_nan() || l.is_nan() {
                f64::NAN
            } else if l == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + g / l)
            }
        })
        .collect()
}
