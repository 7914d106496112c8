//! Statistics Calculator Module
//! Box-plot summaries, value counts and cross tabulations for charting.

use rayon::prelude::*;
use statrs::statistics::{Data, OrderStatistics};
use std::collections::HashMap;

/// Whiskers reach the furthest value within this many IQRs of the box.
pub const WHISKER_IQR: f64 = 1.5;

/// Five-number summary of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub group: String,
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    /// Values beyond the whiskers.
    pub outliers: usize,
}

/// Counts of every pair of categories, row-major over `y_labels` then `x_labels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossTab {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn max_count(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Box-plot summary of `values`, ignoring NaN. `None` when nothing is left.
    pub fn box_summary(group: &str, values: &[f64]) -> Option<BoxSummary> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut data = Data::new(sorted.clone());
        let q1 = data.lower_quartile();
        let median = data.median();
        let q3 = data.upper_quartile();
        let iqr = q3 - q1;

        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .filter(|&&v| v < whisker_low || v > whisker_high)
            .count();

        Some(BoxSummary {
            group: group.to_string(),
            count: sorted.len(),
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Summaries for every group in parallel, keeping the input order.
    pub fn box_summaries(groups: &[(String, Vec<f64>)]) -> Vec<BoxSummary> {
        groups
            .par_iter()
            .filter_map(|(group, values)| Self::box_summary(group, values))
            .collect()
    }

    /// Occurrences of each label, most frequent first (ties by label).
    pub fn value_counts<'a, I>(labels: I) -> Vec<(String, usize)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in labels {
            *counts.entry(label).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(label, n)| (label.to_string(), n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Count co-occurrences of `(x, y)` pairs over the given label sets.
    /// Pairs whose labels aren't listed are skipped.
    pub fn crosstab<'a, I>(pairs: I, x_labels: &[String], y_labels: &[String]) -> CrossTab
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let x_index: HashMap<&str, usize> = x_labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let y_index: HashMap<&str, usize> = y_labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut counts = vec![vec![0usize; x_labels.len()]; y_labels.len()];
        for (x, y) in pairs {
            if let (Some(&xi), Some(&yi)) = (x_index.get(x), y_index.get(y)) {
                counts[yi][xi] += 1;
            }
        }

        CrossTab {
            x_labels: x_labels.to_vec(),
            y_labels: y_labels.to_vec(),
            counts,
        }
    }
}
