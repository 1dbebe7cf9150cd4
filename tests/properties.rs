use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use vigor_analytics::analyzer::alignment::align;
use vigor_analytics::analyzer::anomaly::AnomalyDetector;
use vigor_analytics::analyzer::trend::classify_window;
use vigor_analytics::analyzer::vigor::{categorize, categorize_parallel};
use vigor_analytics::config::{AnalyticsConfig, default_vigor_categories};
use vigor_analytics::model::{AnomalyKind, IndexPoint, IndexType, SceneStat, Trend};

fn sample() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -2.0f64..2.0,
        1 => Just(f64::NAN),
        1 => prop_oneof![Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
    ]
}

fn scenes(year: i32, offsets: Vec<i64>) -> Vec<SceneStat> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    let mut days = offsets;
    days.sort_unstable();
    days.into_iter()
        .enumerate()
        .map(|(i, d)| SceneStat {
            scene_id: format!("{year}-{i}"),
            sensing_date: start + Duration::days(d),
            mean_value: Some(0.5),
            min_value: None,
            max_value: None,
            std_dev: None,
            cloud_coverage: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn counts_sum_to_total_valid(values in prop::collection::vec(sample(), 0..300)) {
        let cats = default_vigor_categories();
        let dist = categorize(&values, &cats);
        let finite = values.iter().filter(|v| v.is_finite()).count();
        prop_assert_eq!(dist.total_valid(), finite);
        prop_assert_eq!(dist.total_input(), values.len());

        match dist.histogram() {
            Some(h) => {
                let count: usize = h.buckets.iter().map(|b| b.count).sum();
                let pct: f64 = h.buckets.iter().map(|b| b.percentage).sum();
                prop_assert_eq!(count, finite);
                prop_assert!((pct - 100.0).abs() < 1e-6);
            }
            None => prop_assert_eq!(finite, 0),
        }
    }

    #[test]
    fn categorizing_is_idempotent(values in prop::collection::vec(sample(), 0..100)) {
        let cats = default_vigor_categories();
        prop_assert_eq!(categorize(&values, &cats), categorize(&values, &cats));
        prop_assert_eq!(categorize(&values, &cats), categorize_parallel(&values, &cats));
    }

    #[test]
    fn alignment_preserves_length_and_tolerance(
        current in prop::collection::vec(0i64..365, 0..40),
        reference in prop::collection::vec(0i64..365, 0..40),
        tolerance in 0u32..30,
    ) {
        let current = scenes(2024, current);
        let reference = scenes(2023, reference);
        let pairs = align(&current, &reference, tolerance);
        prop_assert_eq!(pairs.len(), current.len());
        for (pair, scene) in pairs.iter().zip(&current) {
            prop_assert_eq!(&pair.current, scene);
            prop_assert_eq!(pair.reference.is_some(), pair.day_offset.is_some());
            if let Some(offset) = pair.day_offset {
                prop_assert!(offset <= tolerance);
            }
        }
    }

    #[test]
    fn rising_windows_improve_and_falling_decline(
        start in -1.0f64..1.0,
        steps in prop::collection::vec(0.01f64..0.2, 1..6),
        epsilon in 0.0f64..0.005,
    ) {
        let mut window = vec![start];
        for step in &steps {
            let last = *window.last().unwrap();
            window.push(last + step);
        }
        prop_assert_eq!(classify_window(&window, epsilon).trend, Trend::Improving);
        window.reverse();
        prop_assert_eq!(classify_window(&window, epsilon).trend, Trend::Declining);
    }

    #[test]
    fn low_threshold_is_exclusive(below in 1e-9f64..0.1) {
        let config = AnalyticsConfig::default();
        let detector = AnomalyDetector::from_config(&config, IndexType::Ndvi).unwrap();
        let low = detector.thresholds.low_threshold;
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let at = detector.detect(&[IndexPoint::new(date, Some(low))]);
        prop_assert!(at.iter().all(|r| r.anomaly_type != AnomalyKind::Low));

        let under = detector.detect(&[IndexPoint::new(date, Some(low - below))]);
        prop_assert!(under.iter().any(|r| r.anomaly_type == AnomalyKind::Low));
    }
}
