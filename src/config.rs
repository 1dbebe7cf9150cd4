use crate::model::{ConfigError, IndexType};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One bin of the vigor table. `min` is inclusive, `max` exclusive.
///
/// The first category is unbounded below and the last one unbounded above;
/// a finite `min`/`max` on those ends is only a display hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VigorCategory {
    pub label: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub color: String,
}

impl VigorCategory {
    pub fn new(label: &str, min: Option<f64>, max: Option<f64>, color: &str) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
            color: color.to_string(),
        }
    }
}

/// Canonical vigor table shared by histograms and color scales.
pub fn default_vigor_categories() -> Vec<VigorCategory> {
    vec![
        VigorCategory::new("VeryLow", None, Some(0.0), "#8b0000"),
        VigorCategory::new("Low", Some(0.0), Some(0.3), "#e74c3c"),
        VigorCategory::new("Moderate", Some(0.3), Some(0.5), "#f39c12"),
        VigorCategory::new("Good", Some(0.5), Some(0.7), "#f1c40f"),
        VigorCategory::new("High", Some(0.7), Some(0.9), "#2ecc71"),
        VigorCategory::new("VeryHigh", Some(0.9), None, "#006400"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexThresholds {
    pub low_threshold: f64,
    pub high_threshold: f64,
}

impl IndexThresholds {
    pub fn new(low_threshold: f64, high_threshold: f64) -> Self {
        Self {
            low_threshold,
            high_threshold,
        }
    }

    pub fn mid_range(&self) -> f64 {
        (self.low_threshold + self.high_threshold) / 2.0
    }

    /// Distance from either threshold to the mid-range.
    pub fn threshold_gap(&self) -> f64 {
        (self.high_threshold - self.low_threshold) / 2.0
    }
}

pub fn default_thresholds() -> BTreeMap<IndexType, IndexThresholds> {
    let vigor = IndexThresholds::new(0.3, 0.8);
    let moisture = IndexThresholds::new(0.0, 0.6);
    BTreeMap::from([
        (IndexType::Ndvi, vigor),
        (IndexType::Evi, vigor),
        (IndexType::Savi, vigor),
        (IndexType::Msavi, vigor),
        (IndexType::Gndvi, vigor),
        (IndexType::Ndre, vigor),
        (IndexType::Ndmi, moisture),
        (IndexType::Ndwi, moisture),
    ])
}

/// User-supplied thresholds override the defaults per index instead of replacing the map.
fn merge_default_thresholds<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<IndexType, IndexThresholds>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<IndexType, IndexThresholds>::deserialize(deserializer)?;
    let mut merged = default_thresholds();
    merged.extend(overrides);
    Ok(merged)
}

/// Z-score outlier detection against each point's prior history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutlierConfig {
    pub z_score_threshold: f64,
    pub critical_z_score: f64,
    pub min_observations: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: 2.5,
            critical_z_score: 3.0,
            min_observations: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLocale {
    #[default]
    En,
    Es,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    pub vigor_categories: Vec<VigorCategory>,
    pub alignment_tolerance_days: u32,
    pub trend_window_size: usize,
    pub trend_epsilon: f64,
    #[serde(deserialize_with = "merge_default_thresholds")]
    pub thresholds: BTreeMap<IndexType, IndexThresholds>,
    pub sudden_change_delta: f64,
    pub severity_multiplier: f64,
    /// Scenes cloudier than this (percent) are left out of the analysis.
    pub max_cloud_coverage: Option<f64>,
    pub outlier_detection: Option<OutlierConfig>,
    pub message_locale: MessageLocale,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            vigor_categories: default_vigor_categories(),
            alignment_tolerance_days: 7,
            trend_window_size: 3,
            trend_epsilon: 0.02,
            thresholds: default_thresholds(),
            sudden_change_delta: 0.15,
            severity_multiplier: 0.5,
            max_cloud_coverage: Some(20.0),
            outlier_detection: None,
            message_locale: MessageLocale::En,
        }
    }
}

impl AnalyticsConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalyticsConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn thresholds_for(&self, index_type: IndexType) -> Option<&IndexThresholds> {
        self.thresholds.get(&index_type)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_categories(&self.vigor_categories)?;

        if self.trend_window_size < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "trendWindowSize",
                value: self.trend_window_size.to_string(),
                reason: "a trend needs at least 2 points".into(),
            });
        }
        require_non_negative("trendEpsilon", self.trend_epsilon)?;
        require_non_negative("suddenChangeDelta", self.sudden_change_delta)?;
        require_non_negative("severityMultiplier", self.severity_multiplier)?;

        for (index, t) in &self.thresholds {
            require_finite(&format!("thresholds.{index}.lowThreshold"), t.low_threshold)?;
            require_finite(&format!("thresholds.{index}.highThreshold"), t.high_threshold)?;
            if t.low_threshold >= t.high_threshold {
                return Err(ConfigError::InvalidParameter {
                    name: "thresholds",
                    value: format!("{index}: {}..{}", t.low_threshold, t.high_threshold),
                    reason: "lowThreshold must be below highThreshold".into(),
                });
            }
        }

        if let Some(max_cloud) = self.max_cloud_coverage {
            require_finite("maxCloudCoverage", max_cloud)?;
            if !(0.0..=100.0).contains(&max_cloud) {
                return Err(ConfigError::InvalidParameter {
                    name: "maxCloudCoverage",
                    value: max_cloud.to_string(),
                    reason: "must be a percentage in 0..=100".into(),
                });
            }
        }

        if let Some(outliers) = &self.outlier_detection {
            require_finite("outlierDetection.zScoreThreshold", outliers.z_score_threshold)?;
            require_finite("outlierDetection.criticalZScore", outliers.critical_z_score)?;
            if outliers.z_score_threshold <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "outlierDetection.zScoreThreshold",
                    value: outliers.z_score_threshold.to_string(),
                    reason: "must be positive".into(),
                });
            }
            if outliers.critical_z_score < outliers.z_score_threshold {
                return Err(ConfigError::InvalidParameter {
                    name: "outlierDetection.criticalZScore",
                    value: outliers.critical_z_score.to_string(),
                    reason: "must not be below zScoreThreshold".into(),
                });
            }
            if outliers.min_observations < 2 {
                return Err(ConfigError::InvalidParameter {
                    name: "outlierDetection.minObservations",
                    value: outliers.min_observations.to_string(),
                    reason: "a standard deviation needs at least 2 observations".into(),
                });
            }
        }

        Ok(())
    }
}

/// Checks that the table is ascending and contiguous with open outer ends.
pub fn validate_categories(categories: &[VigorCategory]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::EmptyCategories);
    }
    let last = categories.len() - 1;

    for (i, cat) in categories.iter().enumerate() {
        if let Some(min) = cat.min {
            require_finite(&format!("{}.min", cat.label), min)?;
        } else if i != 0 {
            return Err(ConfigError::MissingBound {
                label: cat.label.clone(),
                side: "lower",
            });
        }
        if let Some(max) = cat.max {
            require_finite(&format!("{}.max", cat.label), max)?;
        } else if i != last {
            return Err(ConfigError::MissingBound {
                label: cat.label.clone(),
                side: "upper",
            });
        }

        if let (Some(min), Some(max)) = (cat.min, cat.max) {
            if min >= max {
                return Err(ConfigError::NotAscending {
                    label: cat.label.clone(),
                    min,
                    max,
                });
            }
        }

        if i > 0 {
            let prev = &categories[i - 1];
            // Both bounds are present here: interior bounds were checked above.
            let (Some(previous_max), Some(next_min)) = (prev.max, cat.min) else {
                continue;
            };
            if previous_max != next_min {
                return Err(ConfigError::Gap {
                    previous: prev.label.clone(),
                    next: cat.label.clone(),
                    previous_max,
                    next_min,
                });
            }
        }
    }
    Ok(())
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must not be negative".into(),
        });
    }
    Ok(())
}

/// One entity/index series the report runner analyzes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    pub entity_id: String,
    #[serde(default = "default_index_type")]
    pub index_type: IndexType,
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    #[serde(default)]
    pub reference_start: Option<NaiveDate>,
    #[serde(default)]
    pub reference_end: Option<NaiveDate>,
    #[serde(default)]
    pub resolution: Option<usize>,
}

fn default_index_type() -> IndexType {
    IndexType::Ndvi
}

impl RequestConfig {
    pub fn reference_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.reference_start.zip(self.reference_end)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    pub data_file: String,
    pub requests: Vec<RequestConfig>,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.analytics.validate()?;

    for request in &config.requests {
        if request.reference_start.is_some() != request.reference_end.is_some() {
            return Err(ConfigError::InvalidParameter {
                name: "requests.referenceStart/referenceEnd",
                value: request.entity_id.clone(),
                reason: "reference range needs both ends".into(),
            });
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AnalyticsConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = AnalyticsConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }

    #[test]
    fn threshold_overrides_merge_into_defaults() {
        let config = AnalyticsConfig::from_json_str(
            r#"{"thresholds": {"NDVI": {"lowThreshold": 0.2, "highThreshold": 0.9}}}"#,
        )
        .unwrap();
        let ndvi = config.thresholds_for(IndexType::Ndvi).unwrap();
        assert_eq!(ndvi.low_threshold, 0.2);
        assert!(config.thresholds_for(IndexType::Ndmi).is_some());
        assert!(config.thresholds_for(IndexType::Cire).is_none());
    }

    #[test]
    fn threshold_keys_ignore_case() {
        let config = AnalyticsConfig::from_json_str(
            r#"{"thresholds": {"ndvi": {"lowThreshold": 0.2, "highThreshold": 0.9}, "Cire": {"lowThreshold": 1.0, "highThreshold": 4.0}}}"#,
        )
        .unwrap();
        assert_eq!(config.thresholds_for(IndexType::Ndvi).unwrap().low_threshold, 0.2);
        assert_eq!(config.thresholds_for(IndexType::Cire).unwrap().high_threshold, 4.0);
    }

    #[test]
    fn unknown_threshold_key_is_a_parse_error() {
        assert!(matches!(
            AnalyticsConfig::from_json_str(
                r#"{"thresholds": {"lai": {"lowThreshold": 0.2, "highThreshold": 0.9}}}"#
            ),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn gap_between_categories_is_rejected() {
        let categories = vec![
            VigorCategory::new("Low", None, Some(0.3), "#f00"),
            VigorCategory::new("High", Some(0.35), None, "#0f0"),
        ];
        assert!(matches!(
            validate_categories(&categories),
            Err(ConfigError::Gap { .. })
        ));
    }

    #[test]
    fn descending_category_is_rejected() {
        let categories = vec![
            VigorCategory::new("Low", None, Some(0.5), "#f00"),
            VigorCategory::new("Mid", Some(0.5), Some(0.2), "#ff0"),
            VigorCategory::new("High", Some(0.2), None, "#0f0"),
        ];
        assert!(matches!(
            validate_categories(&categories),
            Err(ConfigError::NotAscending { .. })
        ));
    }

    #[test]
    fn interior_bound_is_required() {
        let categories = vec![
            VigorCategory::new("Low", None, None, "#f00"),
            VigorCategory::new("High", Some(0.5), None, "#0f0"),
        ];
        assert!(matches!(
            validate_categories(&categories),
            Err(ConfigError::MissingBound { side: "upper", .. })
        ));
    }

    #[test]
    fn nominal_outer_bounds_are_allowed() {
        let categories = vec![
            VigorCategory::new("Low", Some(-1.0), Some(0.5), "#f00"),
            VigorCategory::new("High", Some(0.5), Some(1.0), "#0f0"),
        ];
        validate_categories(&categories).unwrap();
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = AnalyticsConfig::default();
        config
            .thresholds
            .insert(IndexType::Ndvi, IndexThresholds::new(0.8, 0.3));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "thresholds", .. })
        ));
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let mut config = AnalyticsConfig::default();
        config
            .thresholds
            .insert(IndexType::Evi, IndexThresholds::new(f64::NAN, 0.8));
        assert!(matches!(config.validate(), Err(ConfigError::NonFinite { .. })));
    }

    #[test]
    fn window_of_one_is_rejected() {
        let config = AnalyticsConfig {
            trend_window_size: 1,
            ..AnalyticsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_gap_is_half_the_band() {
        let t = IndexThresholds::new(0.3, 0.8);
        assert!((t.mid_range() - 0.55).abs() < 1e-12);
        assert!((t.threshold_gap() - 0.25).abs() < 1e-12);
    }
}
