//! Tabular Data Loader Module
//! Decodes CSV, JSON and zipped CSV/JSON files into Polars DataFrames.

use polars::prelude::*;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};
use ::zip::ZipArchive;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),
    #[error("No CSV or JSON file found in ZIP archive: {}", .0.display())]
    EmptyArchive(PathBuf),
    #[error("Failed to parse table: {0}")]
    Parse(#[from] PolarsError),
    #[error("Failed to read ZIP archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// File formats the loader can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Zip,
}

impl FileFormat {
    /// Pick a format from the file-name suffix, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "zip" => Ok(FileFormat::Zip),
            _ if ext.is_empty() => Err(LoaderError::UnsupportedFormat(String::new())),
            _ => Err(LoaderError::UnsupportedFormat(format!(".{ext}"))),
        }
    }

    /// Format of an archive member. Only tabular members qualify.
    fn from_entry_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(FileFormat::Csv)
        } else if lower.ends_with(".json") {
            Some(FileFormat::Json)
        } else {
            None
        }
    }
}

/// Decodes local files into DataFrames with Polars.
#[derive(Debug, Clone)]
pub struct DataLoader {
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(10000),
        }
    }

    /// Load a local file, dispatching on its extension.
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let format = FileFormat::from_path(path)?;
        let df = match format {
            FileFormat::Csv => self.parse_csv(fs::read(path)?)?,
            FileFormat::Json => self.parse_json(fs::read(path)?)?,
            FileFormat::Zip => self.load_zip(path)?,
        };

        info!(rows = df.height(), columns = df.width(), "loaded table");
        Ok(df)
    }

    /// Decode the first CSV/JSON member of a ZIP archive, in listing order.
    fn load_zip(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let Some(format) = FileFormat::from_entry_name(entry.name()) else {
                debug!(entry = entry.name(), "skipping archive member");
                continue;
            };

            debug!(entry = entry.name(), "decoding archive member");
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;

            return match format {
                FileFormat::Json => self.parse_json(buf),
                _ => self.parse_csv(buf),
            };
        }

        Err(LoaderError::EmptyArchive(path.to_path_buf()))
    }

    fn parse_csv(&self, bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    fn parse_json(&self, bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = JsonReader::new(Cursor::new(bytes)).finish()?;
        Ok(df)
    }
}

/// Column names of a DataFrame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use ::zip::write::FileOptions;
    use ::zip::ZipWriter;

    const CSV: &str = "Arrest Date,OFNS_DESC,Arrest Boro\n\
                       2021-01-01,FELONY,B\n\
                       ,MISDEMEANOR,Q\n\
                       2021-01-03,VIOLATION,M\n";

    const JSON: &str = r#"[
        {"arrest_key": 1, "ofns_desc": "FELONY"},
        {"arrest_key": 2, "ofns_desc": "VIOLATION"}
    ]"#;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn write_zip(dir: &TempDir, name: &str, members: &[(&str, &str)]) -> PathBuf {
        let path = dir.path().join(name);
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for (member, body) in members {
            zip.start_file(*member, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn loads_csv_with_header() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "arrests.csv", CSV.as_bytes());

        let df = DataLoader::new().load(&path).unwrap();

        assert_eq!(column_names(&df), ["Arrest Date", "OFNS_DESC", "Arrest Boro"]);
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("Arrest Date").unwrap().null_count(), 1);
    }

    #[test]
    fn loads_json_records() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "arrests.json", JSON.as_bytes());

        let df = DataLoader::new().load(&path).unwrap();

        assert_eq!(df.height(), 2);
        let mut names = column_names(&df);
        names.sort();
        assert_eq!(names, ["arrest_key", "ofns_desc"]);
    }

    #[test]
    fn extension_match_ignores_case() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ARRESTS.CSV", CSV.as_bytes());

        let df = DataLoader::new().load(&path).unwrap();
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn zip_uses_first_tabular_member() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(
            &dir,
            "bundle.zip",
            &[
                ("README.txt", "not a table"),
                ("data/arrests.json", JSON),
                ("data/arrests.csv", CSV),
            ],
        );

        let df = DataLoader::new().load(&path).unwrap();

        // The JSON member comes first in the listing, so the CSV is ignored.
        assert_eq!(df.height(), 2);
        assert!(df.column("ofns_desc").is_ok());
    }

    #[test]
    fn zip_wrapping_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(&dir, "bundle.zip", &[("arrests.csv", CSV)]);

        let df = DataLoader::new().load(&path).unwrap();
        assert_eq!(column_names(&df), ["Arrest Date", "OFNS_DESC", "Arrest Boro"]);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn zip_without_tabular_member_is_empty_archive() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(&dir, "bundle.zip", &[("notes.txt", "hello")]);

        let err = DataLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoaderError::EmptyArchive(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "arrests.txt", CSV.as_bytes());

        let err = DataLoader::new().load(&path).unwrap_err();
        match err {
            LoaderError::UnsupportedFormat(ext) => assert_eq!(ext, ".txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.Json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("/tmp/x.zip")).unwrap(), FileFormat::Zip);
        assert!(FileFormat::from_path(Path::new("no_extension")).is_err());
        assert!(FileFormat::from_path(Path::new("table.parquet")).is_err());
    }
}
