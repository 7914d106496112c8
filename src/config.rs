//! Runtime configuration passed explicitly into the store, fetcher and shell.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "warehouse.db";
pub const DEFAULT_TABLE: &str = "arrests";
pub const DEFAULT_CHART_DIR: &str = "charts";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    /// SQLite file holding every stored table.
    pub db_path: PathBuf,
    /// Table name offered when the user leaves the prompt blank.
    pub default_table: String,
    /// Where rendered charts are written.
    pub chart_dir: PathBuf,
    /// Download timeout; `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// Open rendered charts with the system viewer.
    pub open_charts: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            default_table: DEFAULT_TABLE.to_string(),
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
            fetch_timeout: Some(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)),
            open_charts: false,
        }
    }
}

impl WarehouseConfig {
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = dir.into();
        self
    }

    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = table.into();
        self
    }

    /// Timeout in whole seconds; `0` disables it.
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn with_open_charts(mut self, open: bool) -> Self {
        self.open_charts = open;
        self
    }
}
