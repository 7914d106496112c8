//! Data Processor Module
//! Column-name normalization and removal of incomplete arrest rows.

use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

/// Key columns that every stored arrest row must carry.
pub const KEY_COLUMNS: [&str; 2] = ["arrest_date", "ofns_desc"];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// What normalization changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// `(original, normalized)` pairs for every column whose name changed.
    pub renamed: Vec<(String, String)>,
    /// Earlier columns discarded because a later one normalized to the same name.
    pub shadowed: Vec<String>,
    pub rows_dropped: usize,
}

/// Handles data cleaning operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Lower-case a column name and replace spaces with underscores.
    pub fn normalize_name(name: &str) -> String {
        name.to_lowercase().replace(' ', "_")
    }

    /// Normalized name of the column at `index`. Blank headers, such as the
    /// index column of a pandas export, become `unnamed:_<index>`.
    pub fn normalize_column_name(index: usize, name: &str) -> String {
        if name.trim().is_empty() {
            format!("unnamed:_{index}")
        } else {
            Self::normalize_name(name)
        }
    }

    /// Normalize column names and drop rows missing either key column.
    pub fn normalize(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::normalize_with_report(df).map(|(df, _)| df)
    }

    /// Same as [`DataProcessor::normalize`], also reporting what changed.
    ///
    /// When several columns normalize to the same name the last one wins and
    /// keeps its own position.
    pub fn normalize_with_report(
        df: DataFrame,
    ) -> Result<(DataFrame, NormalizeReport), ProcessorError> {
        let mut report = NormalizeReport::default();

        let normalized: Vec<String> = df
            .get_column_names()
            .iter()
            .enumerate()
            .map(|(i, name)| Self::normalize_column_name(i, name))
            .collect();

        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        for (i, column) in df.get_columns().iter().enumerate() {
            let new_name = &normalized[i];
            let original = column.name().to_string();

            if normalized[i + 1..].contains(new_name) {
                warn!(column = %original, normalized = %new_name, "column shadowed by a later duplicate");
                report.shadowed.push(original);
                continue;
            }

            let mut column = column.clone();
            if original != *new_name {
                column.rename(new_name.as_str().into());
                report.renamed.push((original, new_name.clone()));
            }
            columns.push(column);
        }

        let renamed = DataFrame::new(columns)?;
        let before = renamed.height();
        let cleaned = Self::drop_incomplete_rows(renamed)?;
        report.rows_dropped = before - cleaned.height();

        debug!(
            renamed = report.renamed.len(),
            rows_dropped = report.rows_dropped,
            "normalized table"
        );
        Ok((cleaned, report))
    }

    /// Drop rows with a missing value in any key column, when all key columns exist.
    fn drop_incomplete_rows(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        let mut predicate: Option<Expr> = None;

        for key in KEY_COLUMNS {
            let Ok(column) = df.column(key) else {
                return Ok(df);
            };

            let mut present = col(key).is_not_null();
            if column.dtype().is_float() {
                present = present.and(col(key).is_not_nan());
            }
            predicate = Some(match predicate {
                Some(p) => p.and(present),
                None => present,
            });
        }

        match predicate {
            Some(p) => Ok(df.lazy().filter(p).collect()?),
            None => Ok(df),
        }
    }
}
