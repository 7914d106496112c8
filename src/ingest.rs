//! Ingestion pipeline: fetch → load → normalize → store.

use crate::config::WarehouseConfig;
use crate::data::{column_names, DataLoader, DataProcessor, LoaderError, ProcessorError};
use crate::source::{FetchError, FetchedFile, SourceFetcher};
use crate::store::{StoreError, TableStore};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Normalize(#[from] ProcessorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// A local path that doesn't exist; callers may offer a retry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IngestError::Fetch(FetchError::NotFound(_)))
    }
}

/// Outcome of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub rows_dropped: usize,
}

/// A source decoded and normalized, not yet stored.
#[derive(Debug)]
pub struct PreparedTable {
    pub df: DataFrame,
    pub rows_dropped: usize,
}

/// Runs the ingestion stages against one store.
#[derive(Debug, Clone)]
pub struct Ingestor {
    fetcher: SourceFetcher,
    loader: DataLoader,
    store: TableStore,
}

impl Ingestor {
    pub fn new(fetcher: SourceFetcher, store: TableStore) -> Self {
        Self {
            fetcher,
            loader: DataLoader::new(),
            store,
        }
    }

    pub fn from_config(config: &WarehouseConfig) -> Result<Self, IngestError> {
        let fetcher = SourceFetcher::new(config.fetch_timeout)?;
        Ok(Self::new(fetcher, TableStore::from_config(config)))
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Resolve a path or URL to a local file.
    pub fn fetch(&self, source: &str) -> Result<FetchedFile, IngestError> {
        Ok(self.fetcher.fetch(source)?)
    }

    /// Decode and normalize a fetched file. Temporary downloads are removed afterwards.
    #[instrument(level = "info", skip(self, file), fields(path = %file.path().display()))]
    pub fn prepare(&self, file: FetchedFile) -> Result<PreparedTable, IngestError> {
        let raw = self.loader.load(file.path())?;
        drop(file);

        let (df, report) = DataProcessor::normalize_with_report(raw)?;
        Ok(PreparedTable {
            df,
            rows_dropped: report.rows_dropped,
        })
    }

    /// Replace `table` with a prepared frame.
    pub fn persist(&self, table: &str, prepared: PreparedTable) -> Result<IngestReport, IngestError> {
        self.store.write(table, &prepared.df)?;
        let report = IngestReport {
            table: table.to_string(),
            rows: prepared.df.height(),
            columns: column_names(&prepared.df),
            rows_dropped: prepared.rows_dropped,
        };
        info!(table = %report.table, rows = report.rows, dropped = report.rows_dropped, "ingested");
        Ok(report)
    }

    /// Full pipeline. Nothing is written unless every earlier stage succeeds.
    pub fn run(&self, source: &str, table: &str) -> Result<IngestReport, IngestError> {
        let file = self.fetch(source)?;
        let prepared = self.prepare(file)?;
        self.persist(table, prepared)
    }
}
