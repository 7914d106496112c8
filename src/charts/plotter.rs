//! Chart Plotter Module
//! Chooses a chart for two columns and extracts the data to draw.

use crate::stats::{BoxSummary, CrossTab, StatsCalculator};
use crate::store::StoreError;
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Categorical axes keep only this many of the most frequent categories.
pub const MAX_CATEGORIES: usize = 20;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Nothing to plot: {0}")]
    NoData(String),
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("Failed to write chart: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter,
    Box,
    Bar,
    Heatmap,
}

impl ChartKind {
    /// Pick a chart from the numeric-ness of the two axes.
    /// `y_numeric` is `None` when the Y axis is a row count.
    pub fn infer(x_numeric: bool, y_numeric: Option<bool>) -> Self {
        match y_numeric {
            None => ChartKind::Bar,
            Some(y) if x_numeric && y => ChartKind::Scatter,
            Some(y) if x_numeric != y => ChartKind::Box,
            Some(_) => ChartKind::Heatmap,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Box => "box",
            ChartKind::Bar => "bar",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

/// Numeric dtypes are plotted on continuous axes, everything else is categorical.
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Which two columns of which table to plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub table: String,
    pub x: String,
    /// `None` plots the number of rows per X value.
    pub y: Option<String>,
}

impl ChartRequest {
    pub fn new(table: impl Into<String>, x: impl Into<String>, y: Option<String>) -> Self {
        Self {
            table: table.into(),
            x: x.into(),
            y,
        }
    }

    /// Output file name, e.g. `arrests_box_arrest_boro_age.png`.
    pub fn file_name(&self, kind: ChartKind) -> String {
        let mut parts = vec![self.table.as_str(), kind.label(), self.x.as_str()];
        if let Some(y) = &self.y {
            parts.push(y);
        }
        let stem: String = parts
            .join("_")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{stem}.png")
    }
}

/// Data ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Scatter {
        points: Vec<(f64, f64)>,
    },
    Box {
        groups: Vec<(String, Vec<f64>)>,
        summaries: Vec<BoxSummary>,
    },
    Bar {
        counts: Vec<(String, usize)>,
    },
    Heatmap(CrossTab),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

/// Turns table columns into chart data.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn prepare(df: &DataFrame, request: &ChartRequest) -> Result<PreparedChart, ChartError> {
        let x_numeric = is_numeric(df.column(&request.x)?.dtype());
        let y_numeric = match &request.y {
            Some(y) => Some(is_numeric(df.column(y)?.dtype())),
            None => None,
        };
        let kind = ChartKind::infer(x_numeric, y_numeric);

        let chart = match (kind, request.y.as_deref()) {
            (ChartKind::Bar, _) | (_, None) => {
                let labels = Self::labels(df, &request.x)?;
                let counts: Vec<(String, usize)> =
                    StatsCalculator::value_counts(labels.iter().flatten().map(String::as_str))
                        .into_iter()
                        .take(MAX_CATEGORIES)
                        .collect();
                PreparedChart {
                    kind: ChartKind::Bar,
                    title: format!("{}: rows by {}", request.table, request.x),
                    x_label: request.x.clone(),
                    y_label: "count".to_string(),
                    data: ChartData::Bar { counts },
                }
            }
            (ChartKind::Scatter, Some(y)) => {
                let xs = Self::numbers(df, &request.x)?;
                let ys = Self::numbers(df, y)?;
                let points = xs
                    .into_iter()
                    .zip(ys)
                    .filter_map(|pair| match pair {
                        (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((x, y)),
                        _ => None,
                    })
                    .collect();
                PreparedChart {
                    kind,
                    title: format!("{}: {} vs {}", request.table, y, request.x),
                    x_label: request.x.clone(),
                    y_label: y.to_string(),
                    data: ChartData::Scatter { points },
                }
            }
            (ChartKind::Box, Some(y)) => {
                let (category, value) = if x_numeric { (y, request.x.as_str()) } else { (request.x.as_str(), y) };
                let groups = Self::grouped_numbers(df, category, value)?;
                let summaries = StatsCalculator::box_summaries(&groups);
                PreparedChart {
                    kind,
                    title: format!("{}: {} by {}", request.table, value, category),
                    x_label: category.to_string(),
                    y_label: value.to_string(),
                    data: ChartData::Box { groups, summaries },
                }
            }
            (ChartKind::Heatmap, Some(y)) => {
                let xs = Self::labels(df, &request.x)?;
                let ys = Self::labels(df, y)?;
                let x_labels = Self::top_labels(&xs);
                let y_labels = Self::top_labels(&ys);
                let pairs = xs.iter().zip(&ys).filter_map(|pair| match pair {
                    (Some(x), Some(y)) => Some((x.as_str(), y.as_str())),
                    _ => None,
                });
                let tab = StatsCalculator::crosstab(pairs, &x_labels, &y_labels);
                PreparedChart {
                    kind,
                    title: format!("{}: {} x {}", request.table, request.x, y),
                    x_label: request.x.clone(),
                    y_label: y.to_string(),
                    data: ChartData::Heatmap(tab),
                }
            }
        };

        if chart.is_empty() {
            return Err(ChartError::NoData(format!(
                "no complete values in {}",
                request.table
            )));
        }
        Ok(chart)
    }

    /// Column values as strings; nulls stay `None`.
    fn labels(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ChartError> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let values = column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(values)
    }

    fn numbers(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ChartError> {
        let column = df.column(name)?.cast(&DataType::Float64)?;
        let values = column.f64()?.into_iter().collect();
        Ok(values)
    }

    /// Numeric values split by the most frequent categories, most frequent first.
    fn grouped_numbers(
        df: &DataFrame,
        category: &str,
        value: &str,
    ) -> Result<Vec<(String, Vec<f64>)>, ChartError> {
        let labels = Self::labels(df, category)?;
        let values = Self::numbers(df, value)?;
        let order = Self::top_labels(&labels);

        let mut by_label: HashMap<&str, Vec<f64>> = HashMap::new();
        for (label, v) in labels.iter().zip(values) {
            if let (Some(label), Some(v)) = (label, v) {
                if !v.is_nan() {
                    by_label.entry(label.as_str()).or_default().push(v);
                }
            }
        }

        Ok(order
            .iter()
            .filter_map(|label| {
                by_label
                    .remove(label.as_str())
                    .map(|values| (label.clone(), values))
            })
            .collect())
    }

    fn top_labels(labels: &[Option<String>]) -> Vec<String> {
        StatsCalculator::value_counts(labels.iter().flatten().map(String::as_str))
            .into_iter()
            .take(MAX_CATEGORIES)
            .map(|(label, _)| label)
            .collect()
    }
}

impl PreparedChart {
    pub fn is_empty(&self) -> bool {
        match &self.data {
            ChartData::Scatter { points } => points.is_empty(),
            ChartData::Box { groups, .. } => groups.is_empty(),
            ChartData::Bar { counts } => counts.is_empty(),
            ChartData::Heatmap(tab) => tab.max_count() == 0,
        }
    }
}
