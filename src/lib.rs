//! Arrest Warehouse - ingest arrest-record files into a local SQLite store.
//!
//! Sources (local paths or URLs to CSV, JSON or zipped files) are fetched,
//! decoded into polars DataFrames, normalized and written as tables. The
//! interactive shell and the chart layer read those tables back.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod ingest;
pub mod logging;
pub mod shell;
pub mod source;
pub mod stats;
pub mod store;

pub use config::WarehouseConfig;
pub use ingest::{IngestError, IngestReport, Ingestor};
pub use store::{StoreError, TableDescription, TableStore};
