// Scene preparation ahead of analysis
use crate::model::{IndexPoint, SceneStat};
use tracing::debug;

/// Scenes usable for analysis: cloud coverage within `max_cloud_coverage`
/// (unknown coverage is kept), ordered by sensing date.
pub fn usable_scenes(scenes: &[SceneStat], max_cloud_coverage: Option<f64>) -> Vec<SceneStat> {
    let mut usable: Vec<SceneStat> = scenes
        .iter()
        .filter(|s| is_clear_enough(s, max_cloud_coverage))
        .cloned()
        .collect();
    usable.sort_by_key(|s| s.sensing_date);

    let dropped = scenes.len() - usable.len();
    if dropped > 0 {
        debug!("Filtered {} cloudy scenes out of {}", dropped, scenes.len());
    }
    usable
}

fn is_clear_enough(scene: &SceneStat, max_cloud_coverage: Option<f64>) -> bool {
    match (scene.cloud_coverage, max_cloud_coverage) {
        (Some(coverage), Some(max)) if coverage.is_finite() => coverage <= max,
        _ => true,
    }
}

/// Keeps every `step`-th scene so that at most roughly `resolution` remain.
pub fn downsample(scenes: Vec<SceneStat>, resolution: Option<usize>) -> Vec<SceneStat> {
    match resolution {
        Some(target) if target > 0 && scenes.len() > target => {
            let step = (scenes.len() / target).max(1);
            scenes.into_iter().step_by(step).collect()
        }
        _ => scenes,
    }
}

/// Mean values as a dated series for trend and anomaly detection.
pub fn mean_points(scenes: &[SceneStat]) -> Vec<IndexPoint> {
    scenes
        .iter()
        .map(|s| IndexPoint::new(s.sensing_date, s.mean_value))
        .collect()
}
