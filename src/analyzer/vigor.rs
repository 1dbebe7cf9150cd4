//! Vigor categorization: bins index samples into the ordered category table
//! and reports the percentage distribution.

use crate::config::VigorCategory;
use crate::model::{Distribution, HistogramBucket, VigorHistogram};
use rayon::prelude::*;
use tracing::debug;

/// Samples per partition when categorizing in parallel.
pub const PARALLEL_CHUNK: usize = 64 * 1024;

/// Per-category counts. Merging two partial counts is associative and
/// commutative, so partitions can be counted independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCounts {
    pub counts: Vec<usize>,
    pub total_input: usize,
    pub total_valid: usize,
}

impl CategoryCounts {
    pub fn empty(categories: usize) -> Self {
        Self {
            counts: vec![0; categories],
            total_input: 0,
            total_valid: 0,
        }
    }

    pub fn merge(mut self, other: CategoryCounts) -> Self {
        for (acc, n) in self.counts.iter_mut().zip(other.counts) {
            *acc += n;
        }
        self.total_input += other.total_input;
        self.total_valid += other.total_valid;
        self
    }
}

/// Index of the first category where `min <= value < max`, with the first
/// lower bound and last upper bound treated as unbounded.
///
/// Returns `None` only for non-finite values when the table is contiguous.
pub fn category_index(value: f64, categories: &[VigorCategory]) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let last = categories.len().checked_sub(1)?;
    categories.iter().enumerate().position(|(i, cat)| {
        let lower = if i == 0 {
            f64::NEG_INFINITY
        } else {
            cat.min.unwrap_or(f64::NEG_INFINITY)
        };
        let upper = if i == last {
            f64::INFINITY
        } else {
            cat.max.unwrap_or(f64::INFINITY)
        };
        lower <= value && value < upper
    })
}

pub fn count_categories(values: &[f64], categories: &[VigorCategory]) -> CategoryCounts {
    let mut counts = CategoryCounts::empty(categories.len());
    counts.total_input = values.len();
    for &value in values {
        if let Some(i) = category_index(value, categories) {
            counts.counts[i] += 1;
            counts.total_valid += 1;
        }
    }
    counts
}

/// Turns counts into a distribution; `NoData` when nothing was valid.
pub fn build_distribution(counts: CategoryCounts, categories: &[VigorCategory]) -> Distribution {
    if counts.total_valid == 0 {
        return Distribution::NoData {
            total_input: counts.total_input,
        };
    }
    let total = counts.total_valid as f64;
    let buckets = categories
        .iter()
        .zip(&counts.counts)
        .map(|(cat, &count)| HistogramBucket {
            category: cat.label.clone(),
            color: cat.color.clone(),
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect();

    Distribution::Histogram(VigorHistogram {
        total_input: counts.total_input,
        total_valid: counts.total_valid,
        buckets,
    })
}

/// Categorizes a batch of samples. Non-finite values are counted in
/// `total_input` but not in `total_valid`.
pub fn categorize(values: &[f64], categories: &[VigorCategory]) -> Distribution {
    let counts = count_categories(values, categories);
    log_dropped(&counts);
    build_distribution(counts, categories)
}

/// Same result as [`categorize`], counting partitions on the rayon pool.
pub fn categorize_parallel(values: &[f64], categories: &[VigorCategory]) -> Distribution {
    let counts = values
        .par_chunks(PARALLEL_CHUNK)
        .map(|chunk| count_categories(chunk, categories))
        .reduce(|| CategoryCounts::empty(categories.len()), CategoryCounts::merge);
    log_dropped(&counts);
    build_distribution(counts, categories)
}

fn log_dropped(counts: &CategoryCounts) {
    let dropped = counts.total_input - counts.total_valid;
    if dropped > 0 {
        debug!(
            "Dropped {} non-finite samples out of {}",
            dropped, counts.total_input
        );
    }
}
