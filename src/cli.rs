//! Command-line surface of the `warehouse` binary.

use crate::charts::DEFAULT_GROUP_BY;
use crate::config::{
    WarehouseConfig, DEFAULT_CHART_DIR, DEFAULT_DB_PATH, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_TABLE,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "warehouse", version, about = "Arrest record ingestion and personal data warehouse")]
pub struct Cli {
    /// Start the interactive menu even when a subcommand is given
    #[arg(long)]
    pub cli: bool,

    /// SQLite database file
    #[arg(long, global = true, env = "WAREHOUSE_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Table used when none is given
    #[arg(long, global = true, env = "WAREHOUSE_TABLE", default_value = DEFAULT_TABLE)]
    pub default_table: String,

    /// Directory for rendered charts
    #[arg(long, global = true, env = "WAREHOUSE_CHART_DIR", default_value = DEFAULT_CHART_DIR)]
    pub chart_dir: PathBuf,

    /// Download timeout in seconds, 0 to wait indefinitely
    #[arg(long, global = true, env = "WAREHOUSE_FETCH_TIMEOUT", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout: u64,

    /// Open rendered charts with the system viewer
    #[arg(long, global = true, env = "WAREHOUSE_OPEN_CHARTS")]
    pub open: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a local file or URL into a table
    Ingest {
        /// Path or http(s) URL of a .csv, .json or .zip file
        source: String,
        /// Target table (replaced if it exists)
        #[arg(long)]
        table: Option<String>,
    },
    /// List stored tables
    List,
    /// Row count, columns and a sample of a table
    Describe {
        table: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bar chart of row counts per group
    Dashboard {
        #[arg(long)]
        table: Option<String>,
        #[arg(long, default_value = DEFAULT_GROUP_BY)]
        group_by: String,
        /// Output PNG (defaults to a file in the chart directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    pub fn config(&self) -> WarehouseConfig {
        WarehouseConfig::default()
            .with_db_path(&self.db)
            .with_default_table(&self.default_table)
            .with_chart_dir(&self.chart_dir)
            .with_fetch_timeout_secs(self.fetch_timeout)
            .with_open_charts(self.open)
    }

    pub fn is_interactive(&self) -> bool {
        self.cli || self.command.is_none()
    }
}
