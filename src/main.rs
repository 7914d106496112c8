//! Arrest Warehouse - command-line entry point.
//!
//! Without a subcommand, or with `--cli`, the interactive menu runs on stdin/stdout.

use anyhow::{Context, Result};
use arrest_warehouse::charts::{dashboard_chart, ChartData, DashboardRequest};
use arrest_warehouse::cli::{Cli, Command};
use arrest_warehouse::logging::init_logging;
use arrest_warehouse::shell::{Shell, ShellOptions};
use arrest_warehouse::{Ingestor, TableStore, WarehouseConfig};
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    if cli.is_interactive() {
        return interactive(config);
    }
    match cli.command {
        None => interactive(config),
        Some(Command::Ingest { source, table }) => ingest(&config, &source, table),
        Some(Command::List) => list(&config),
        Some(Command::Describe { table, json }) => describe(&config, &table, json),
        Some(Command::Dashboard {
            table,
            group_by,
            out,
        }) => {
            let table = table.unwrap_or_else(|| config.default_table.clone());
            let output = out.unwrap_or_else(|| {
                config
                    .chart_dir
                    .join(format!("dashboard_{table}_{group_by}.png"))
            });
            dashboard(
                &config,
                DashboardRequest {
                    table,
                    group_by,
                    output,
                },
            )
        }
    }
}

fn interactive(config: WarehouseConfig) -> Result<()> {
    let stdin = std::io::stdin();
    let mut shell = Shell::new(config, ShellOptions::default(), stdin.lock(), std::io::stdout())?;
    shell.run()?;
    Ok(())
}

fn ingest(config: &WarehouseConfig, source: &str, table: Option<String>) -> Result<()> {
    let table = table.unwrap_or_else(|| config.default_table.clone());
    let ingestor = Ingestor::from_config(config)?;
    let report = ingestor
        .run(source, &table)
        .with_context(|| format!("could not ingest {source}"))?;

    println!(
        "Data loaded into {} (table: {})",
        config.db_path.display(),
        report.table
    );
    println!(
        "{} rows, {} columns, {} incomplete rows dropped",
        report.rows,
        report.columns.len(),
        report.rows_dropped
    );
    Ok(())
}

fn list(config: &WarehouseConfig) -> Result<()> {
    let tables = TableStore::from_config(config).list()?;
    if tables.is_empty() {
        println!("No tables found in the database.");
    }
    for table in tables {
        println!("{table}");
    }
    Ok(())
}

fn describe(config: &WarehouseConfig, table: &str, json: bool) -> Result<()> {
    let desc = TableStore::from_config(config).describe(table)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&desc)?);
        return Ok(());
    }

    println!("Table: {}", desc.name);
    println!("Rows: {}", desc.row_count);
    println!("Columns: {}", desc.columns.join(", "));
    println!("Sample data:");
    println!("{}", desc.sample);
    Ok(())
}

fn dashboard(config: &WarehouseConfig, request: DashboardRequest) -> Result<()> {
    let store = TableStore::from_config(config);
    let chart = dashboard_chart(&store, &request.table, &request.group_by)?;
    if let ChartData::Bar { counts } = &chart.data {
        println!("{:<24} count", request.group_by);
        for (label, count) in counts {
            println!("{label:<24} {count}");
        }
    }

    #[cfg(feature = "plot")]
    {
        use arrest_warehouse::charts::{open_chart, ChartRenderer};

        ChartRenderer::default()
            .render(&chart, &request.output)
            .with_context(|| format!("could not render {}", request.output.display()))?;
        println!("Saved dashboard to {}", request.output.display());
        if config.open_charts {
            open_chart(&request.output)?;
        }
    }
    Ok(())
}
