/// Apply `reduce` to every full window of `window` consecutive values.
///
/// Output position `i` holds the reduction of `data[i + 1 - window..=i]`.
/// The first `window - 1` positions are NaN, as is any position whose window
/// contains a NaN. A zero window yields all NaN.
pub fn rolling<F>(data: &[f64], window: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 || window > data.len() {
        return vec![f64::NAN; data.len()];
    }

    let mut out = vec![f64::NAN; window - 1];
    out.extend(data.windows(window).map(|w| {
        if w.iter().any(|x| x.is_nan()) {
            f64::NAN
        } else {
            reduce(w)
        }
    }));
    out
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_alignment() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let sums = rolling(&data, 2, |w| w.iter().sum());

        assert_eq!(sums.len(), 4);
        assert!(sums[0].is_nan());
        assert_eq!(&sums[1..], &[3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_rolling_propagates_nan() {
        let data = vec![f64::NAN, 1.0, 2.0, 3.0];
        let sums = rolling(&data, 2, |w| w.iter().sum());

        assert!(sums[0].is_nan());
        assert!(sums[1].is_nan());
        assert_eq!(sums[2], 3.0);
        assert_eq!(sums[3], 5.0);
    }

    #[test]
    fn test_rolling_degenerate_windows() {
        let data = vec![1.0, 2.0];
        assert!(rolling(&data, 0, mean).iter().all(|x| x.is_nan()));
        assert!(rolling(&data, 3, mean).iter().all(|x| x.is_nan()));
        assert!(rolling(&[], 3, mean).is_empty());
    }
}
