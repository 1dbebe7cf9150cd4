//! Threshold, rate-of-change and statistical anomaly detection for one
//! index series.
//!
//! Severity escalates to `Critical` when the excess past a threshold is
//! larger than `severity_multiplier` times a reference gap:
//!
//! * `low` / `high`: excess is the distance past the threshold, the gap is
//!   the distance from the threshold to the mid-range of `low..high`.
//! * `sudden_change`: excess is `|change| - sudden_change_delta`, the gap is
//!   `sudden_change_delta` itself.
//!
//! The rule is monotonic: a larger breach never yields a lower severity.

use crate::analyzer::statistics::mean_and_std;
use crate::config::{AnalyticsConfig, IndexThresholds, MessageLocale, OutlierConfig};
use crate::model::{AnalysisError, AnomalyKind, AnomalyRecord, IndexPoint, IndexType, Severity};
use chrono::NaiveDate;

/// Spreads at or below this are treated as a flat history.
const MIN_STD_DEV: f64 = 1e-12;

pub fn escalate(excess: f64, gap: f64, severity_multiplier: f64) -> Severity {
    if excess > severity_multiplier * gap {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

/// Percent change from `previous`; `None` without a usable base.
pub fn change_percent(value: f64, previous: Option<f64>) -> Option<f64> {
    match previous {
        Some(prev) if prev != 0.0 => Some((value - prev) / prev.abs() * 100.0),
        _ => None,
    }
}

/// One rule firing at one point.
#[derive(Debug, Clone, Copy)]
struct Breach {
    kind: AnomalyKind,
    severity: Severity,
    magnitude: f64,
    threshold: f64,
}

fn build_record(
    date: NaiveDate,
    index_type: IndexType,
    value: f64,
    previous_value: Option<f64>,
    breach: Breach,
    locale: MessageLocale,
) -> AnomalyRecord {
    let mut record = AnomalyRecord {
        date,
        index_type,
        value,
        anomaly_type: breach.kind,
        severity: breach.severity,
        magnitude: breach.magnitude,
        threshold: breach.threshold,
        previous_value,
        change_percent: change_percent(value, previous_value),
        recommendation: String::new(),
        message: String::new(),
    };
    record.recommendation = recommendation(&record, locale);
    record.message = describe(&record, locale);
    record
}

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    pub index_type: IndexType,
    pub thresholds: IndexThresholds,
    pub sudden_change_delta: f64,
    pub severity_multiplier: f64,
    pub locale: MessageLocale,
}

impl AnomalyDetector {
    pub fn from_config(config: &AnalyticsConfig, index_type: IndexType) -> Result<Self, AnalysisError> {
        let thresholds = config
            .thresholds_for(index_type)
            .copied()
            .ok_or(AnalysisError::MissingThresholds(index_type))?;
        Ok(Self {
            index_type,
            thresholds,
            sudden_change_delta: config.sudden_change_delta,
            severity_multiplier: config.severity_multiplier,
            locale: config.message_locale,
        })
    }

    /// Scans a chronologically ordered series.
    ///
    /// Each rule is checked independently, so one point can produce several
    /// records. Missing or non-finite values are skipped and the next valid
    /// point is compared with the last valid one before the gap.
    pub fn detect(&self, points: &[IndexPoint]) -> Vec<AnomalyRecord> {
        let IndexThresholds {
            low_threshold,
            high_threshold,
        } = self.thresholds;
        let gap = self.thresholds.threshold_gap();
        let mut records = Vec::new();
        let mut previous: Option<f64> = None;

        for point in points {
            let Some(value) = point.valid_value() else {
                continue;
            };
            let mut breaches = Vec::new();

            if value < low_threshold {
                let excess = low_threshold - value;
                breaches.push(Breach {
                    kind: AnomalyKind::Low,
                    severity: escalate(excess, gap, self.severity_multiplier),
                    magnitude: excess,
                    threshold: low_threshold,
                });
            }

            if value > high_threshold {
                let excess = value - high_threshold;
                breaches.push(Breach {
                    kind: AnomalyKind::High,
                    severity: escalate(excess, gap, self.severity_multiplier),
                    magnitude: excess,
                    threshold: high_threshold,
                });
            }

            if let Some(prev) = previous {
                let change = (value - prev).abs();
                if change > self.sudden_change_delta {
                    let excess = change - self.sudden_change_delta;
                    breaches.push(Breach {
                        kind: AnomalyKind::SuddenChange,
                        severity: escalate(excess, self.sudden_change_delta, self.severity_multiplier),
                        magnitude: excess,
                        threshold: self.sudden_change_delta,
                    });
                }
            }

            records.extend(breaches.into_iter().map(|breach| {
                build_record(point.date, self.index_type, value, previous, breach, self.locale)
            }));
            previous = Some(value);
        }
        records
    }
}

/// Flags points whose z-score against all prior valid points reaches the
/// configured threshold. Points without `min_observations` of history, or
/// with a flat history, are not scored.
pub fn detect_outliers(
    points: &[IndexPoint],
    index_type: IndexType,
    config: &OutlierConfig,
    locale: MessageLocale,
) -> Vec<AnomalyRecord> {
    let mut history: Vec<f64> = Vec::new();
    let mut records = Vec::new();

    for point in points {
        let Some(value) = point.valid_value() else {
            continue;
        };

        if history.len() >= config.min_observations {
            if let Some((mean, std)) = mean_and_std(&history) {
                if std > MIN_STD_DEV {
                    let z = (value - mean) / std;
                    if z.abs() >= config.z_score_threshold {
                        let severity = if z.abs() >= config.critical_z_score {
                            Severity::Critical
                        } else {
                            Severity::Warning
                        };
                        let breach = Breach {
                            kind: AnomalyKind::Outlier,
                            severity,
                            magnitude: z,
                            threshold: config.z_score_threshold,
                        };
                        records.push(build_record(
                            point.date,
                            index_type,
                            value,
                            Some(mean),
                            breach,
                            locale,
                        ));
                    }
                }
            }
        }
        history.push(value);
    }
    records
}

fn is_moisture_index(index_type: IndexType) -> bool {
    matches!(index_type, IndexType::Ndmi | IndexType::Ndwi)
}

fn is_chlorophyll_index(index_type: IndexType) -> bool {
    matches!(index_type, IndexType::Cire | IndexType::Ndre)
}

/// Suggested follow-up for a record, by kind, severity and index family.
pub fn recommendation(record: &AnomalyRecord, locale: MessageLocale) -> String {
    let critical = record.severity == Severity::Critical;
    let index = record.index_type;
    let (en, es) = match record.anomaly_type {
        AnomalyKind::Low if is_moisture_index(index) => {
            if critical {
                (
                    "Severe water stress detected. Consider urgent irrigation.",
                    "Estrés hídrico severo detectado. Considerar riego urgente.",
                )
            } else {
                (
                    "Low water content. Monitor and plan irrigation if needed.",
                    "Contenido de agua bajo. Monitorear y planificar riego si es necesario.",
                )
            }
        }
        AnomalyKind::Low if is_chlorophyll_index(index) => {
            if critical {
                (
                    "Significant chlorophyll drop. Possible nitrogen deficiency or disease.",
                    "Caída significativa de clorofila. Posible deficiencia de nitrógeno o enfermedad.",
                )
            } else {
                (
                    "Reduced chlorophyll content. Assess nutritional status.",
                    "Contenido de clorofila reducido. Evaluar estado nutricional.",
                )
            }
        }
        AnomalyKind::High if is_moisture_index(index) => {
            if critical {
                (
                    "Excess water detected. Check field drainage.",
                    "Exceso de agua detectado. Revisar el drenaje de la parcela.",
                )
            } else {
                (
                    "High water content. Watch for waterlogging.",
                    "Contenido de agua alto. Vigilar encharcamiento.",
                )
            }
        }
        AnomalyKind::High => {
            if critical {
                (
                    "Value far above the expected range. Verify the reading before acting.",
                    "Valor muy por encima del rango esperado. Verificar la lectura antes de actuar.",
                )
            } else {
                (
                    "Above the expected range. Compare with nearby scenes.",
                    "Por encima del rango esperado. Comparar con escenas cercanas.",
                )
            }
        }
        AnomalyKind::SuddenChange if record.previous_value.is_some_and(|p| record.value > p) => {
            if critical {
                (
                    "Sharp increase. Check the scene for clouds or processing artifacts.",
                    "Aumento brusco. Revisar la escena por nubes o artefactos de procesamiento.",
                )
            } else {
                (
                    "Rapid growth. Confirm against the next scene.",
                    "Crecimiento rápido. Confirmar con la siguiente escena.",
                )
            }
        }
        AnomalyKind::Low | AnomalyKind::SuddenChange => {
            if critical {
                (
                    "Inspect the crop immediately. Possible severe stress, disease or damage.",
                    "Inspeccionar el cultivo inmediatamente. Posible estrés severo, enfermedad o daño.",
                )
            } else {
                (
                    "Watch the parcel. Consider a visual inspection if it persists.",
                    "Vigilar la parcela. Considerar inspección visual si persiste.",
                )
            }
        }
        AnomalyKind::Outlier => {
            let z = record.magnitude;
            return match locale {
                MessageLocale::En => {
                    format!("Statistically anomalous value (z-score: {z:.2}). Investigate the cause.")
                }
                MessageLocale::Es => {
                    format!("Valor estadísticamente anómalo (z-score: {z:.2}). Investigar causa.")
                }
            };
        }
    };
    match locale {
        MessageLocale::En => en.to_string(),
        MessageLocale::Es => es.to_string(),
    }
}

/// Human-readable line for a record, ending with its recommendation.
pub fn describe(record: &AnomalyRecord, locale: MessageLocale) -> String {
    let headline = headline(record, locale);
    let change = match (record.change_percent, record.anomaly_type, locale) {
        (None, _, _) => String::new(),
        (Some(pct), AnomalyKind::Outlier, MessageLocale::En) => format!(" [{pct:+.1}% vs mean]"),
        (Some(pct), AnomalyKind::Outlier, MessageLocale::Es) => {
            format!(" [{pct:+.1}% respecto a la media]")
        }
        (Some(pct), _, MessageLocale::En) => format!(" [{pct:+.1}% vs previous]"),
        (Some(pct), _, MessageLocale::Es) => format!(" [{pct:+.1}% respecto al anterior]"),
    };
    if record.recommendation.is_empty() {
        format!("{headline}{change}")
    } else {
        format!("{headline}{change}. {}", record.recommendation)
    }
}

fn headline(record: &AnomalyRecord, locale: MessageLocale) -> String {
    let date = record.date.format("%Y-%m-%d");
    let index = record.index_type;
    let value = record.value;
    let threshold = record.threshold;
    let magnitude = record.magnitude;

    match locale {
        MessageLocale::En => {
            let level = match record.severity {
                Severity::Warning => "WARNING",
                Severity::Critical => "ALERT",
            };
            match record.anomaly_type {
                AnomalyKind::Low => format!(
                    "{level}: {index} {value:.3} on {date} is below the low threshold {threshold:.3} by {magnitude:.3}"
                ),
                AnomalyKind::High => format!(
                    "{level}: {index} {value:.3} on {date} is above the high threshold {threshold:.3} by {magnitude:.3}"
                ),
                AnomalyKind::SuddenChange => {
                    let previous = record.previous_value.unwrap_or(value);
                    format!(
                        "{level}: {index} changed {:+.3} on {date} ({previous:.3} -> {value:.3}), more than {threshold:.3}",
                        value - previous
                    )
                }
                AnomalyKind::Outlier => format!(
                    "{level}: {index} {value:.3} on {date} is statistically anomalous (z-score {magnitude:+.2})"
                ),
            }
        }
        MessageLocale::Es => {
            let level = match record.severity {
                Severity::Warning => "AVISO",
                Severity::Critical => "ALERTA",
            };
            match record.anomaly_type {
                AnomalyKind::Low => format!(
                    "{level}: {index} {value:.3} el {date} está por debajo del umbral bajo {threshold:.3} en {magnitude:.3}"
                ),
                AnomalyKind::High => format!(
                    "{level}: {index} {value:.3} el {date} está por encima del umbral alto {threshold:.3} en {magnitude:.3}"
                ),
                AnomalyKind::SuddenChange => {
                    let previous = record.previous_value.unwrap_or(value);
                    format!(
                        "{level}: {index} cambió {:+.3} el {date} ({previous:.3} -> {value:.3}), más de {threshold:.3}",
                        value - previous
                    )
                }
                AnomalyKind::Outlier => format!(
                    "{level}: {index} {value:.3} el {date} es estadísticamente anómalo (z-score {magnitude:+.2})"
                ),
            }
        }
    }
}
