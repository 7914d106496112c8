//! Arrest counts per group, read back from the store.

use crate::charts::plotter::{ChartData, ChartError, ChartKind, PreparedChart};
use crate::stats::StatsCalculator;
use crate::store::TableStore;
use polars::prelude::*;
use std::path::PathBuf;

pub const DEFAULT_GROUP_BY: &str = "arrest_boro";

/// Label used for rows whose group value is missing.
pub const MISSING_LABEL: &str = "(missing)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub table: String,
    pub group_by: String,
    pub output: PathBuf,
}

/// Rows per distinct value of `group_by`, largest group first.
pub fn grouped_counts(
    store: &TableStore,
    table: &str,
    group_by: &str,
) -> Result<Vec<(String, usize)>, ChartError> {
    let df = store.read(table)?;
    let column = df.column(group_by)?.cast(&DataType::String)?;
    let labels = column.str()?;
    Ok(StatsCalculator::value_counts(
        labels.into_iter().map(|v| v.unwrap_or(MISSING_LABEL)),
    ))
}

/// Bar chart of every group count.
pub fn dashboard_chart(
    store: &TableStore,
    table: &str,
    group_by: &str,
) -> Result<PreparedChart, ChartError> {
    let counts = grouped_counts(store, table, group_by)?;
    Ok(PreparedChart {
        kind: ChartKind::Bar,
        title: format!("{table}: rows by {group_by}"),
        x_label: group_by.to_string(),
        y_label: "count".to_string(),
        data: ChartData::Bar { counts },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_arrests() -> (tempfile::TempDir, TableStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::new(dir.path().join("warehouse.db"));
        let df = df!(
            "arrest_boro" => [Some("K"), Some("Q"), Some("K"), None, Some("K")],
            "ofns_desc" => ["ASSAULT 3", "ROBBERY", "FELONY ASSAULT", "ROBBERY", "PETIT LARCENY"],
        )
        .unwrap();
        store.write("arrests", &df).unwrap();
        (dir, store)
    }

    #[test]
    fn counts_ordered_descending() {
        let (_dir, store) = store_with_arrests();
        let counts = grouped_counts(&store, "arrests", DEFAULT_GROUP_BY).unwrap();

        assert_eq!(counts[0], ("K".to_string(), 3));
        assert_eq!(counts.len(), 3);
        assert!(counts.contains(&(MISSING_LABEL.to_string(), 1)));
    }

    #[test]
    fn missing_table_is_reported() {
        let (_dir, store) = store_with_arrests();
        assert!(matches!(
            grouped_counts(&store, "nope", DEFAULT_GROUP_BY),
            Err(ChartError::Store(crate::store::StoreError::TableNotFound(_)))
        ));
    }

    #[test]
    fn chart_is_a_bar() {
        let (_dir, store) = store_with_arrests();
        let chart = dashboard_chart(&store, "arrests", "ofns_desc").unwrap();

        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.x_label, "ofns_desc");
        match chart.data {
            ChartData::Bar { counts } => assert_eq!(counts[0], ("ROBBERY".to_string(), 2)),
            other => panic!("unexpected data: {other:?}"),
        }
    }
}
