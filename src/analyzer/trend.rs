use crate::model::{Trend, TrendReport};

/// Classifies a window by `last - first` against `epsilon`.
///
/// Non-finite entries are skipped; fewer than 2 remaining points is
/// `Indeterminate`.
pub fn classify_window(window: &[f64], epsilon: f64) -> TrendReport {
    let valid: Vec<f64> = window.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
        return indeterminate(valid.len());
    };
    if valid.len() < 2 {
        return indeterminate(valid.len());
    }

    let delta = last - first;
    let trend = if delta > epsilon {
        Trend::Improving
    } else if delta < -epsilon {
        Trend::Declining
    } else {
        Trend::Stable
    };
    TrendReport {
        trend,
        delta: Some(delta),
        points_used: valid.len(),
    }
}

/// Classifies the last `window_size` valid values of a series.
pub fn classify_recent(values: &[Option<f64>], window_size: usize, epsilon: f64) -> TrendReport {
    let valid: Vec<f64> = values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect();
    let start = valid.len().saturating_sub(window_size);
    classify_window(&valid[start..], epsilon)
}

fn indeterminate(points_used: usize) -> TrendReport {
    TrendReport {
        trend: Trend::Indeterminate,
        delta: None,
        points_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_window_is_improving() {
        let report = classify_window(&[0.40, 0.45, 0.50], 0.02);
        assert_eq!(report.trend, Trend::Improving);
        assert_eq!(report.points_used, 3);
    }

    #[test]
    fn falling_window_is_declining() {
        assert_eq!(classify_window(&[0.50, 0.45, 0.40], 0.02).trend, Trend::Declining);
    }

    #[test]
    fn delta_equal_to_epsilon_is_stable() {
        assert_eq!(classify_window(&[0.5, 0.75], 0.25).trend, Trend::Stable);
        assert_eq!(classify_window(&[0.75, 0.5], 0.25).trend, Trend::Stable);
    }

    #[test]
    fn only_endpoints_matter() {
        // A dip in the middle does not change the classification.
        assert_eq!(classify_window(&[0.4, 0.1, 0.41], 0.02).trend, Trend::Stable);
    }

    #[test]
    fn short_windows_are_indeterminate() {
        assert_eq!(classify_window(&[], 0.02).trend, Trend::Indeterminate);
        assert_eq!(classify_window(&[0.4], 0.02).trend, Trend::Indeterminate);
        assert_eq!(classify_window(&[0.4, f64::NAN], 0.02).trend, Trend::Indeterminate);
    }

    #[test]
    fn recent_window_skips_gaps_and_old_points() {
        let series = [Some(0.9), Some(0.2), None, Some(0.25), Some(f64::NAN), Some(0.3)];
        let report = classify_recent(&series, 3, 0.02);
        assert_eq!(report.trend, Trend::Improving);
        assert_eq!(report.points_used, 3);
        assert!((report.delta.unwrap() - 0.1).abs() < 1e-12);
    }
}
