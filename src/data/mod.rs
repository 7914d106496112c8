//! Data module - tabular loading and normalization

mod loader;
mod processor;

pub use loader::{column_names, DataLoader, FileFormat, LoaderError};
pub use processor::{DataProcessor, NormalizeReport, ProcessorError, KEY_COLUMNS};
