//! Vegetation-index analytics for agricultural remote-sensing dashboards.
//!
//! Turns per-scene index statistics into a vigor-category distribution,
//! a year-over-year alignment, a short-term trend and a list of anomalies.
//! All analytics are pure functions over caller-owned values; reading data
//! ([`provider`]) and showing results ([`presenter`]) sit at the edges.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod presenter;
pub mod provider;
pub mod utils;

pub use analyzer::{AnalysisReport, AnalysisRequest, AnalyticsFacade, VegetationAnalyzer};
pub use config::AnalyticsConfig;
