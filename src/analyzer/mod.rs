// Analyzer module: aggregates the vegetation-index analytics components.

pub mod alignment;
pub mod anomaly;
pub mod facade;
pub mod statistics;
pub mod trend;
pub mod vigor;

// Re-export the facade for ease of use.
pub use facade::{AnalysisReport, AnalysisRequest, AnalyticsFacade, VegetationAnalyzer};
