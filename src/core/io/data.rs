use std::ops::Range;

/// Chronological train/test partition of `n_rows` rows.
///
/// Train is the prefix `[0, split)` and test the suffix `[split, n_rows)`;
/// rows are never shuffled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChronoSplit {
    pub split: usize,
    pub n_rows: usize,
}

impl ChronoSplit {
    /// Split at `floor(train_ratio * n_rows)`
    pub fn at_ratio(n_rows: usize, train_ratio: f64) -> Self {
        let split = ((train_ratio * n_rows as f64).floor() as usize).min(n_rows);
        Self { split, n_rows }
    }

    pub fn train(&self) -> Range<usize> {
        0..self.split
    }

    pub fn test(&self) -> Range<usize> {
        self.split..self.n_rows
    }

    pub fn n_train(&self) -> usize {
        self.split
    }

    pub fn n_test(&self) -> usize {
        self.n_rows - self.split
    }
}

/// Fractional close-to-close change, aligned with the input.
///
/// The first element has no predecessor and is NaN.
pub fn pct_change(prices: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return returns;
    }
    returns.push(f64::NAN);
    returns.extend(prices.windows(2).map(|w| w[1] / w[0] - 1.0));
    returns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_ratio() {
        let split = ChronoSplit::at_ratio(10, 0.7);
        assert_eq!(split.split, 7);
        assert_eq!(split.train(), 0..7);
        assert_eq!(split.test(), 7..10);
        assert_eq!(split.n_train() + split.n_test(), 10);

        // floor, not round
        assert_eq!(ChronoSplit::at_ratio(5, 0.99).split, 4);
        assert_eq!(ChronoSplit::at_ratio(3, 0.1).split, 0);
    }

    #[test]
    fn test_split_preserves_order() {
        let rows: Vec<usize> = (0..37).collect();
        let split = ChronoSplit::at_ratio(rows.len(), 0.6);

        let mut rebuilt: Vec<usize> = rows[split.train()].to_vec();
        rebuilt.extend_from_slice(&rows[split.test()]);
        assert_eq!(rebuilt, rows);
        assert!(split.train().all(|i| !split.test().contains(&i)));
    }

    #[test]
    fn test_pct_change() {
        let prices = vec![100.0, 110.0, 104.5, 104.5];
        let returns = pct_change(&prices);

        assert_eq!(returns.len(), 4);
        assert!(returns[0].is_nan());
        assert!((returns[1] - 0.1).abs() < 1e-12);
        assert!((returns[2] - (-0.05)).abs() < 1e-12);
        assert_eq!(returns[3], 0.0);
        assert!(pct_change(&[]).is_empty());
    }
}
