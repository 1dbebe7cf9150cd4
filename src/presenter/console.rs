// presenter/console.rs

use crate::analyzer::AnalysisReport;
use crate::model::{Distribution, PresentError, Trend};
use crate::presenter::Presenter;
use std::fmt::{self, Write as _};
use std::io::Write;
use tracing::{info, warn};

/// Plain-text summary of a report.
pub fn render_report(entity_id: &str, report: &AnalysisReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{} {}: {} scenes, {} usable",
        entity_id, report.index_type, report.total_scenes, report.usable_scenes
    )?;

    match &report.distribution {
        Distribution::NoData { total_input } => {
            writeln!(out, "  distribution: no data ({} samples, none valid)", total_input)?;
        }
        Distribution::Histogram(h) => {
            writeln!(
                out,
                "  distribution: {} of {} samples valid",
                h.total_valid, h.total_input
            )?;
            for bucket in &h.buckets {
                writeln!(
                    out,
                    "    {:<10} {:>6} {:>6.1}%",
                    bucket.category, bucket.count, bucket.percentage
                )?;
            }
        }
    }

    if let Some(summary) = &report.summary {
        writeln!(
            out,
            "  mean {:.3} (min {:.3}, max {:.3}, std {:.3})",
            summary.mean, summary.min, summary.max, summary.std_dev
        )?;
    }

    match report.trend.delta {
        Some(delta) => writeln!(
            out,
            "  trend: {} ({:+.3} over {} scenes)",
            report.trend.trend, delta, report.trend.points_used
        )?,
        None => writeln!(out, "  trend: {}", Trend::Indeterminate)?,
    }

    if let Some(pairs) = &report.alignment {
        let matched = pairs.iter().filter(|p| p.reference.is_some()).count();
        writeln!(out, "  previous year: {}/{} scenes matched", matched, pairs.len())?;
        for pair in pairs {
            if let (Some(delta), Some(offset)) = (pair.mean_delta(), pair.day_offset) {
                writeln!(
                    out,
                    "    {} {:+.3} vs {} days apart",
                    pair.current.sensing_date, delta, offset
                )?;
            }
        }
    }

    if report.anomalies.is_empty() {
        writeln!(out, "  anomalies: none")?;
    } else {
        writeln!(out, "  anomalies: {}", report.anomalies.len())?;
        for record in &report.anomalies {
            writeln!(out, "    {}", record.message)?;
        }
    }
    Ok(out)
}

/// Writes rendered reports to a writer and logs a one-line summary.
pub struct ConsolePresenter<W: Write> {
    writer: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn present(&mut self, entity_id: &str, report: &AnalysisReport) -> Result<(), PresentError> {
        info!(
            "{} {}: trend {}, {} anomalies",
            entity_id,
            report.index_type,
            report.trend.trend,
            report.anomalies.len()
        );
        if let Distribution::NoData { .. } = report.distribution {
            warn!("{} {}: no valid samples", entity_id, report.index_type);
        }
        let text = render_report(entity_id, report)?;
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalysisRequest, AnalyticsFacade};
    use crate::config::AnalyticsConfig;
    use crate::model::{AlignedPair, IndexType, SceneStat};
    use chrono::NaiveDate;

    fn scene(i: usize, mean: f64) -> SceneStat {
        SceneStat {
            scene_id: format!("s{i}"),
            sensing_date: NaiveDate::from_ymd_opt(2024, 7, i as u32 + 1).unwrap(),
            mean_value: Some(mean),
            min_value: None,
            max_value: None,
            std_dev: None,
            cloud_coverage: None,
        }
    }

    fn report(means: &[f64]) -> AnalysisReport {
        let current = means.iter().enumerate().map(|(i, m)| scene(i, *m)).collect();
        let facade = AnalyticsFacade::new(AnalyticsConfig::default()).unwrap();
        facade
            .analyze(&AnalysisRequest {
                index_type: IndexType::Ndvi,
                current,
                reference: None,
                samples: None,
            })
            .unwrap()
    }

    #[test]
    fn renders_histogram_trend_and_anomalies() {
        let text = render_report("parcel-7", &report(&[0.6, 0.62, 0.2])).unwrap();
        assert!(text.starts_with("parcel-7 NDVI: 3 scenes, 3 usable"));
        assert!(text.contains("Good"));
        assert!(text.contains("trend: declining"));
        assert!(text.contains("anomalies: 2"));
    }

    #[test]
    fn renders_no_data() {
        let text = render_report("parcel-7", &report(&[])).unwrap();
        assert!(text.contains("no data"));
        assert!(text.contains("trend: indeterminate"));
        assert!(text.contains("anomalies: none"));
    }

    #[test]
    fn renders_previous_year_and_recommendations() {
        let mut analysis = report(&[0.6, 0.2]);
        analysis.alignment = Some(vec![AlignedPair {
            current: scene(0, 0.6),
            reference: Some(scene(1, 0.5)),
            day_offset: Some(3),
        }]);
        let text = render_report("parcel-7", &analysis).unwrap();
        assert!(text.contains("previous year: 1/1 scenes matched"));
        assert!(text.contains("+0.100 vs 3 days apart"));
        assert!(text.contains("vs previous]"));
        assert!(text.contains("Inspect the crop immediately"));
    }

    #[test]
    fn presenter_writes_to_writer() {
        let mut presenter = ConsolePresenter::new(Vec::new());
        presenter.present("parcel-7", &report(&[0.5, 0.5])).unwrap();
        let written = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(written.contains("trend: stable"));
    }
}
