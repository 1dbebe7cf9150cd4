use crate::analyzer::alignment::align;
use crate::analyzer::anomaly::{AnomalyDetector, detect_outliers};
use crate::analyzer::statistics::summarize;
use crate::analyzer::trend::classify_recent;
use crate::analyzer::vigor::{categorize, categorize_parallel, PARALLEL_CHUNK};
use crate::config::AnalyticsConfig;
use crate::model::{
    AlignedPair, AnalysisError, AnomalyRecord, ConfigError, Distribution, IndexType, SampleSummary,
    SceneStat, TrendReport,
};
use crate::normalizer::{mean_points, usable_scenes};
use serde::Serialize;
use tracing::debug;

/// Trait defining the analytics operations offered to the presentation layer.
pub trait VegetationAnalyzer {
    fn distribution(&self, samples: &[f64]) -> Distribution;
    fn align(&self, current: &[SceneStat], reference: &[SceneStat]) -> Vec<AlignedPair>;
    fn trend(&self, scenes: &[SceneStat]) -> TrendReport;
    fn anomalies(
        &self,
        index_type: IndexType,
        scenes: &[SceneStat],
    ) -> Result<Vec<AnomalyRecord>, AnalysisError>;
}

/// Everything needed for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub index_type: IndexType,
    pub current: Vec<SceneStat>,
    pub reference: Option<Vec<SceneStat>>,
    /// Raw pixel samples. When absent the histogram uses per-scene means.
    pub samples: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub index_type: IndexType,
    pub total_scenes: usize,
    pub usable_scenes: usize,
    pub distribution: Distribution,
    pub summary: Option<SampleSummary>,
    pub alignment: Option<Vec<AlignedPair>>,
    pub trend: TrendReport,
    pub anomalies: Vec<AnomalyRecord>,
}

/// Stateless orchestrator over a validated configuration.
#[derive(Debug, Clone)]
pub struct AnalyticsFacade {
    config: AnalyticsConfig,
}

impl AnalyticsFacade {
    /// Validates the configuration once, so computations can rely on it.
    pub fn new(config: AnalyticsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        let usable = usable_scenes(&request.current, self.config.max_cloud_coverage);

        let samples: Vec<f64> = match &request.samples {
            Some(samples) => samples.clone(),
            None => usable.iter().filter_map(|s| s.mean_value).collect(),
        };
        let distribution = self.distribution(&samples);
        let summary = summarize(&samples);

        let alignment = request.reference.as_ref().map(|reference| {
            let reference = usable_scenes(reference, self.config.max_cloud_coverage);
            self.align(&usable, &reference)
        });

        let trend = self.trend(&usable);
        let anomalies = self.anomalies(request.index_type, &usable)?;

        debug!(
            "Analyzed {} {} scenes ({} usable): trend {}, {} anomalies",
            request.current.len(),
            request.index_type,
            usable.len(),
            trend.trend,
            anomalies.len()
        );

        Ok(AnalysisReport {
            index_type: request.index_type,
            total_scenes: request.current.len(),
            usable_scenes: usable.len(),
            distribution,
            summary,
            alignment,
            trend,
            anomalies,
        })
    }
}

impl VegetationAnalyzer for AnalyticsFacade {
    /// Large pixel batches are counted in parallel partitions.
    fn distribution(&self, samples: &[f64]) -> Distribution {
        if samples.len() > PARALLEL_CHUNK {
            categorize_parallel(samples, &self.config.vigor_categories)
        } else {
            categorize(samples, &self.config.vigor_categories)
        }
    }

    fn align(&self, current: &[SceneStat], reference: &[SceneStat]) -> Vec<AlignedPair> {
        align(current, reference, self.config.alignment_tolerance_days)
    }

    /// Trend over the last `trend_window_size` valid scene means.
    fn trend(&self, scenes: &[SceneStat]) -> TrendReport {
        let means: Vec<Option<f64>> = scenes.iter().map(|s| s.mean_value).collect();
        classify_recent(&means, self.config.trend_window_size, self.config.trend_epsilon)
    }

    fn anomalies(
        &self,
        index_type: IndexType,
        scenes: &[SceneStat],
    ) -> Result<Vec<AnomalyRecord>, AnalysisError> {
        let detector = AnomalyDetector::from_config(&self.config, index_type)?;
        let points = mean_points(scenes);
        let mut records = detector.detect(&points);

        if let Some(outliers) = &self.config.outlier_detection {
            records.extend(detect_outliers(
                &points,
                index_type,
                outliers,
                self.config.message_locale,
            ));
            // Stable: records of the same day keep rule order.
            records.sort_by_key(|r| r.date);
        }
        Ok(records)
    }
}
