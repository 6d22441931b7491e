use crate::window::{mean, rolling};

/// Rolling sample standard deviation (n - 1 denominator).
///
/// A window of one value has no sample deviation and yields NaN.
pub fn rolling_std(data: &[f64], window: usize) -> Vec<f64> {
    if window < 2 {
        return vec![f64::NAN; data.len()];
    }

    rolling(data, window, |w| {
        let m = mean(w);
        let ss: f64 = w.iter().map(|x| (x - m).powi(2)).sum();
        (ss / (w.len() - 1) as f64).sqrt()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_std() {
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = rolling_std(&data, 8);

        assert!(sd[..7].iter().all(|x| x.is_nan()));
        // population sd is 2, sample sd is sqrt(32/7)
        assert!((sd[7] - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_window_is_zero() {
        let sd = rolling_std(&[0.5; 12], 10);
        assert_eq!(sd[9], 0.0);
        assert_eq!(sd[11], 0.0);
    }

    #[test]
    fn test_nan_in_window() {
        let mut returns = vec![0.5; 12];
        returns[0] = f64::NAN;
        let sd = rolling_std(&returns, 10);

        assert!(sd[9].is_nan());
        assert_eq!(sd[10], 0.0);
    }

    #[test]
    fn test_window_of_one() {
        assert!(rolling_std(&[1.0, 2.0], 1).iter().all(|x| x.is_nan()));
    }
}
