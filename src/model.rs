// Core structs: SceneStat, histogram/alignment/trend/anomaly results, errors
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Vegetation index a series was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum IndexType {
    Ndvi,
    Evi,
    Savi,
    Msavi,
    Gndvi,
    Ndre,
    Ndmi,
    Ndwi,
    Cire,
    Custom,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Ndvi => "NDVI",
            IndexType::Evi => "EVI",
            IndexType::Savi => "SAVI",
            IndexType::Msavi => "MSAVI",
            IndexType::Gndvi => "GNDVI",
            IndexType::Ndre => "NDRE",
            IndexType::Ndmi => "NDMI",
            IndexType::Ndwi => "NDWI",
            IndexType::Cire => "CIRE",
            IndexType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = UnknownIndexType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            // An unspecified attribute means the platform default index.
            "" | "NDVI" => Ok(IndexType::Ndvi),
            "EVI" => Ok(IndexType::Evi),
            "SAVI" => Ok(IndexType::Savi),
            "MSAVI" => Ok(IndexType::Msavi),
            "GNDVI" => Ok(IndexType::Gndvi),
            "NDRE" => Ok(IndexType::Ndre),
            "NDMI" => Ok(IndexType::Ndmi),
            "NDWI" => Ok(IndexType::Ndwi),
            "CIRE" => Ok(IndexType::Cire),
            "CUSTOM" => Ok(IndexType::Custom),
            _ => Err(UnknownIndexType(s.to_string())),
        }
    }
}

impl TryFrom<String> for IndexType {
    type Error = UnknownIndexType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Error)]
#[error("unknown vegetation index: {0:?}")]
pub struct UnknownIndexType(pub String);

/// Per-scene index statistics as supplied by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneStat {
    pub scene_id: String,
    #[serde(with = "crate::utils::sensing_date")]
    pub sensing_date: NaiveDate,
    #[serde(default)]
    pub mean_value: Option<f64>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub std_dev: Option<f64>,
    #[serde(default)]
    pub cloud_coverage: Option<f64>,
}

impl SceneStat {
    /// Mean value if present and finite.
    pub fn valid_mean(&self) -> Option<f64> {
        self.mean_value.filter(|v| v.is_finite())
    }
}

/// One observation of a single index series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl IndexPoint {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }

    pub fn valid_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub category: String,
    pub color: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VigorHistogram {
    pub total_input: usize,
    pub total_valid: usize,
    pub buckets: Vec<HistogramBucket>,
}

/// Result of categorizing a batch of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// No finite value was present in the input.
    NoData { total_input: usize },
    Histogram(VigorHistogram),
}

impl Distribution {
    pub fn total_input(&self) -> usize {
        match self {
            Distribution::NoData { total_input } => *total_input,
            Distribution::Histogram(h) => h.total_input,
        }
    }

    pub fn total_valid(&self) -> usize {
        match self {
            Distribution::NoData { .. } => 0,
            Distribution::Histogram(h) => h.total_valid,
        }
    }

    pub fn histogram(&self) -> Option<&VigorHistogram> {
        match self {
            Distribution::NoData { .. } => None,
            Distribution::Histogram(h) => Some(h),
        }
    }
}

/// A current-period scene paired with its nearest reference-period scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub current: SceneStat,
    pub reference: Option<SceneStat>,
    pub day_offset: Option<u32>,
}

impl AlignedPair {
    /// Current mean minus reference mean.
    pub fn mean_delta(&self) -> Option<f64> {
        let current = self.current.valid_mean()?;
        let reference = self.reference.as_ref()?.valid_mean()?;
        Some(current - reference)
    }

    /// Change relative to the reference mean, in percent.
    pub fn change_percent(&self) -> Option<f64> {
        let reference = self.reference.as_ref()?.valid_mean()?;
        if reference == 0.0 {
            return None;
        }
        self.mean_delta().map(|d| d / reference.abs() * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    Indeterminate,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub trend: Trend,
    /// `last - first` over the window; absent when indeterminate.
    pub delta: Option<f64>,
    pub points_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Low,
    High,
    SuddenChange,
    Outlier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub index_type: IndexType,
    pub value: f64,
    pub anomaly_type: AnomalyKind,
    pub severity: Severity,
    /// How far past the threshold the value went (z-score for outliers).
    pub magnitude: f64,
    pub threshold: f64,
    /// Last valid value before this point (history mean for outliers).
    pub previous_value: Option<f64>,
    /// Change relative to `previous_value`, in percent.
    pub change_percent: Option<f64>,
    pub recommendation: String,
    pub message: String,
}

/// NaN-aware summary of a batch of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("vigor category table is empty")]
    EmptyCategories,

    #[error("category {label:?} is missing its {side} bound")]
    MissingBound { label: String, side: &'static str },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    #[error("category {label:?} is not ascending: min {min} >= max {max}")]
    NotAscending { label: String, min: f64, max: f64 },

    #[error("categories {previous:?} and {next:?} are not contiguous: {previous_max} != {next_min}")]
    Gap {
        previous: String,
        next: String,
        previous_max: f64,
        next_min: f64,
    },

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no thresholds configured for index {0}")]
    MissingThresholds(IndexType),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read scene data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scene data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("entity {entity_id} has no {index_type} series")]
    EntityNotFound {
        entity_id: String,
        index_type: IndexType,
    },

    #[error("invalid date range: {start} is not before {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to format report: {0}")]
    Format(#[from] std::fmt::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(day: u32, mean: Option<f64>) -> SceneStat {
        SceneStat {
            scene_id: format!("s{day}"),
            sensing_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            mean_value: mean,
            min_value: None,
            max_value: None,
            std_dev: None,
            cloud_coverage: None,
        }
    }

    #[test]
    fn index_type_parses_case_insensitively() {
        assert_eq!("ndvi".parse::<IndexType>().unwrap(), IndexType::Ndvi);
        assert_eq!(" CIre ".parse::<IndexType>().unwrap(), IndexType::Cire);
        assert_eq!("".parse::<IndexType>().unwrap(), IndexType::Ndvi);
        assert!("lai".parse::<IndexType>().is_err());
    }

    #[test]
    fn index_type_deserializes_case_insensitively() {
        let parsed: Vec<IndexType> = serde_json::from_str(r#"["ndvi", "Ndmi", "GNDVI"]"#).unwrap();
        assert_eq!(parsed, vec![IndexType::Ndvi, IndexType::Ndmi, IndexType::Gndvi]);
        assert!(serde_json::from_str::<IndexType>(r#""lai""#).is_err());
        assert_eq!(serde_json::to_value(IndexType::Msavi).unwrap(), "MSAVI");
    }

    #[test]
    fn valid_mean_rejects_non_finite() {
        assert_eq!(scene(1, Some(f64::NAN)).valid_mean(), None);
        assert_eq!(scene(1, Some(0.4)).valid_mean(), Some(0.4));
    }

    #[test]
    fn pair_change_percent_uses_reference_magnitude() {
        let pair = AlignedPair {
            current: scene(2, Some(0.3)),
            reference: Some(scene(1, Some(-0.2))),
            day_offset: Some(1),
        };
        let delta = pair.mean_delta().unwrap();
        assert!((delta - 0.5).abs() < 1e-12);
        assert!((pair.change_percent().unwrap() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn pair_without_reference_has_no_delta() {
        let pair = AlignedPair {
            current: scene(2, Some(0.3)),
            reference: None,
            day_offset: None,
        };
        assert_eq!(pair.mean_delta(), None);
        assert_eq!(pair.change_percent(), None);
    }

    #[test]
    fn distribution_serializes_with_kind_tag() {
        let json = serde_json::to_value(Distribution::NoData { total_input: 3 }).unwrap();
        assert_eq!(json["kind"], "no_data");
        assert_eq!(json["total_input"], 3);
    }
}
