//! Visualize flow: pick a table and two columns, render a chart.

use super::{Flow, Selection, Shell, ShellError};
use crate::charts::{
    is_numeric, open_chart, ChartData, ChartPlotter, ChartRenderer, ChartRequest,
};
use crate::data::column_names;
use std::io::{BufRead, Write};
use tracing::{info, warn};

impl<R: BufRead, W: Write> Shell<R, W> {
    pub(super) fn visualize(&mut self) -> Result<Flow, ShellError> {
        let Some(tables) = self.list_tables()? else {
            return Ok(Flow::Continue);
        };
        let table = match self.select("Select a table to plot (number): ", tables.len())? {
            Selection::Picked(index) => tables[index].clone(),
            Selection::Rejected => return Ok(Flow::Continue),
            Selection::Eof => return Ok(Flow::Exit),
        };

        let df = match self.store().read(&table) {
            Ok(df) => df,
            Err(e) => {
                writeln!(self.output, "Error: {e}")?;
                return Ok(Flow::Continue);
            }
        };
        let columns = column_names(&df);
        if columns.is_empty() {
            writeln!(self.output, "Table {table} has no columns.")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Columns:")?;
        for (i, column) in df.get_columns().iter().enumerate() {
            let kind = if is_numeric(column.dtype()) {
                "numeric"
            } else {
                "categorical"
            };
            writeln!(self.output, "{}. {} ({})", i + 1, column.name(), kind)?;
        }

        let x = match self.select("Select X column (number): ", columns.len())? {
            Selection::Picked(index) => columns[index].clone(),
            Selection::Rejected => return Ok(Flow::Continue),
            Selection::Eof => return Ok(Flow::Exit),
        };

        let Some(answer) = self.prompt("Select Y column (number, 0 to count rows): ")? else {
            return Ok(Flow::Exit);
        };
        let y = if answer == "0" {
            None
        } else {
            match super::parse_selection(&answer, columns.len()) {
                Ok(index) => Some(columns[index].clone()),
                Err(e) => {
                    writeln!(self.output, "{e}")?;
                    return Ok(Flow::Continue);
                }
            }
        };

        let request = ChartRequest::new(table, x, y);
        let chart = match ChartPlotter::prepare(&df, &request) {
            Ok(chart) => chart,
            Err(e) => {
                writeln!(self.output, "Error: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        let path = self.config.chart_dir.join(request.file_name(chart.kind));
        if let Err(e) = ChartRenderer::default().render(&chart, &path) {
            warn!(error = %e, "render failed");
            writeln!(self.output, "Error: {e}")?;
            return Ok(Flow::Continue);
        }
        info!(path = %path.display(), kind = chart.kind.label(), "chart rendered");
        writeln!(
            self.output,
            "Saved {} chart to {}",
            chart.kind.label(),
            path.display()
        )?;

        if let ChartData::Box { summaries, .. } = &chart.data {
            for s in summaries {
                writeln!(
                    self.output,
                    "{}: n={} median={:.2} q1={:.2} q3={:.2} whiskers=[{:.2}, {:.2}] outliers={}",
                    s.group, s.count, s.median, s.q1, s.q3, s.whisker_low, s.whisker_high, s.outliers
                )?;
            }
        }

        if self.config.open_charts {
            if let Err(e) = open_chart(&path) {
                warn!(error = %e, "could not open chart viewer");
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::WarehouseConfig;
    use crate::shell::{Shell, ShellOptions};
    use crate::store::TableStore;
    use polars::prelude::*;

    fn run(script: &str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let config = WarehouseConfig::default()
            .with_db_path(dir.path().join("warehouse.db"))
            .with_chart_dir(dir.path().join("charts"));
        let df = df!(
            "arrest_boro" => ["K", "Q", "K"],
            "age" => [30i64, 22, 41],
        )
        .unwrap();
        TableStore::from_config(&config).write("arrests", &df).unwrap();

        let mut output = Vec::new();
        let mut shell = Shell::new(
            config,
            ShellOptions { plotting: true },
            script.as_bytes(),
            &mut output,
        )
        .unwrap();
        shell.run().unwrap();
        drop(shell);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn lists_columns_with_kinds() {
        let out = run("3\n1\n9\n4\n");

        assert!(out.contains("1. arrest_boro (categorical)"));
        assert!(out.contains("2. age (numeric)"));
        assert!(out.contains("Invalid selection."));
    }

    #[test]
    fn bad_y_column_returns_to_menu() {
        let out = run("3\n1\n1\nzz\n4\n");

        assert!(out.contains("Select Y column (number, 0 to count rows): "));
        assert!(out.contains("Invalid input."));
        assert!(!out.contains("Saved"));
    }

    #[test]
    fn empty_store_has_nothing_to_plot() {
        let dir = tempfile::tempdir().unwrap();
        let config = WarehouseConfig::default().with_db_path(dir.path().join("empty.db"));
        let mut output = Vec::new();
        let mut shell =
            Shell::new(config, ShellOptions { plotting: true }, "3\n4\n".as_bytes(), &mut output)
                .unwrap();
        shell.run().unwrap();
        drop(shell);

        let out = String::from_utf8(output).unwrap();
        assert!(out.contains("No tables found in the database."));
    }

    #[test]
    fn box_chart_prints_group_summaries() {
        let out = run("3\n1\n1\n2\n4\n");

        assert!(out.contains("Saved box chart to"));
        assert!(out.contains("K: n=2 median=35.50"));
        assert!(out.contains("Q: n=1 median=22.00"));
    }
}
