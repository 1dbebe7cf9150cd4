use crate::model::SampleSummary;

/// Count, mean, min, max and population standard deviation of the finite samples.
pub fn summarize(values: &[f64]) -> Option<SampleSummary> {
    let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return None;
    }

    let count = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / count;
    let std_dev = (valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count).sqrt();
    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(SampleSummary {
        count: valid.len(),
        mean,
        min,
        max,
        std_dev,
    })
}

/// Mean and population standard deviation, used for z-scores.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    summarize(values).map(|s| (s.mean, s.std_dev))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_finite_values() {
        let s = summarize(&[1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert!((s.std_dev - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn nothing_valid_is_none() {
        assert!(summarize(&[]).is_none());
        assert!(summarize(&[f64::NAN, f64::NEG_INFINITY]).is_none());
    }

    #[test]
    fn constant_series_has_zero_spread() {
        let (mean, std) = mean_and_std(&[0.4, 0.4, 0.4]).unwrap();
        assert!((mean - 0.4).abs() < 1e-12);
        assert!(std.abs() < 1e-12);
    }
}
