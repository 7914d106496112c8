use arrest_warehouse::config::WarehouseConfig;
use arrest_warehouse::data::LoaderError;
use arrest_warehouse::source::FetchError;
use arrest_warehouse::{IngestError, Ingestor, StoreError, TableStore};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ::zip::write::FileOptions;
use ::zip::ZipWriter;

const ARRESTS_CSV: &str = "\
ARREST_DATE,OFNS_DESC,ARREST BORO
01/01/2024,ASSAULT 3,K
,ROBBERY,Q
01/03/2024,PETIT LARCENY,M
";

const ARRESTS_JSON: &str = r#"[
    {"Arrest Key": 1, "ARREST_DATE": "2024-01-01", "OFNS_DESC": "ROBBERY"},
    {"Arrest Key": 2, "ARREST_DATE": "2024-01-02", "OFNS_DESC": null},
    {"Arrest Key": 3, "ARREST_DATE": "2024-01-03", "OFNS_DESC": "FELONY ASSAULT"}
]"#;

fn config(dir: &TempDir) -> WarehouseConfig {
    WarehouseConfig::default()
        .with_db_path(dir.path().join("warehouse.db"))
        .with_fetch_timeout_secs(10)
}

fn write_file(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
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

fn source(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn csv_with_missing_date_is_normalized_and_stored() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(&dir, "arrests.csv", ARRESTS_CSV);
    let ingestor = Ingestor::from_config(&config(&dir)).unwrap();

    let report = ingestor.run(&source(&csv), "arrests").unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(report.columns, ["arrest_date", "ofns_desc", "arrest_boro"]);

    let store = ingestor.store();
    assert_eq!(store.list().unwrap(), ["arrests"]);

    let desc = store.describe("arrests").unwrap();
    assert_eq!(desc.row_count, 2);
    assert_eq!(desc.columns, ["arrest_date", "ofns_desc", "arrest_boro"]);

    let df = store.read("arrests").unwrap();
    let offenses: Vec<Option<&str>> = df
        .column("ofns_desc")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(offenses, [Some("ASSAULT 3"), Some("PETIT LARCENY")]);
}

#[test]
fn spaced_headers_and_blank_date_row() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(
        &dir,
        "arrests.csv",
        "Arrest Date,OFNS_DESC,Arrest Boro\n2021-01-01,FELONY,B\n,MISDEMEANOR,Q\n2021-01-03,VIOLATION,M\n",
    );
    let ingestor = Ingestor::from_config(&config(&dir)).unwrap();

    let report = ingestor.run(&source(&csv), "arrests").unwrap();
    assert_eq!(report.table, "arrests");
    assert_eq!(report.rows, 2);
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(report.columns, ["arrest_date", "ofns_desc", "arrest_boro"]);

    let df = ingestor.store().read("arrests").unwrap();
    let offenses: Vec<Option<&str>> = df
        .column("ofns_desc")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(offenses, [Some("FELONY"), Some("VIOLATION")]);
}

#[test]
fn csv_with_index_column_is_ingested() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(
        &dir,
        "export.csv",
        ",ARREST_DATE,OFNS_DESC\n0,2024-01-01,ROBBERY\n1,2024-01-02,FELONY ASSAULT\n",
    );
    let ingestor = Ingestor::from_config(&config(&dir)).unwrap();

    let report = ingestor.run(&source(&csv), "indexed").unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(report.columns, ["unnamed:_0", "arrest_date", "ofns_desc"]);

    let desc = ingestor.store().describe("indexed").unwrap();
    assert_eq!(desc.columns, ["unnamed:_0", "arrest_date", "ofns_desc"]);
    assert_eq!(desc.row_count, 2);
}

#[test]
fn zipped_json_is_ingested() {
    let dir = TempDir::new().unwrap();
    let zip = write_zip(
        &dir,
        "export.zip",
        &[("README", "not data"), ("data/Arrests.JSON", ARRESTS_JSON)],
    );
    let ingestor = Ingestor::from_config(&config(&dir)).unwrap();

    let report = ingestor.run(&source(&zip), "json_arrests").unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(report.columns, ["arrest_key", "arrest_date", "ofns_desc"]);

    let df = ingestor.store().read("json_arrests").unwrap();
    assert_eq!(df.column("arrest_key").unwrap().dtype(), &DataType::Int64);
}

#[test]
fn second_ingest_replaces_the_table() {
    let dir = TempDir::new().unwrap();
    let first = write_file(&dir, "first.csv", ARRESTS_CSV);
    let second = write_file(
        &dir,
        "second.csv",
        "arrest_date,ofns_desc,law_cat_cd\n2024-02-01,ROBBERY,F\n",
    );
    let ingestor = Ingestor::from_config(&config(&dir)).unwrap();

    ingestor.run(&source(&first), "arrests").unwrap();
    ingestor.run(&source(&second), "arrests").unwrap();

    let desc = ingestor.store().describe("arrests").unwrap();
    assert_eq!(desc.row_count, 1);
    assert_eq!(desc.columns, ["arrest_date", "ofns_desc", "law_cat_cd"]);
}

#[test]
fn failures_leave_the_store_untouched() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let ingestor = Ingestor::from_config(&cfg).unwrap();

    let missing = dir.path().join("missing.csv");
    let err = ingestor.run(&source(&missing), "arrests").unwrap_err();
    assert!(err.is_not_found());

    let txt = write_file(&dir, "notes.txt", "hello");
    let err = ingestor.run(&source(&txt), "arrests").unwrap_err();
    assert!(matches!(
        err,
        IngestError::Load(LoaderError::UnsupportedFormat(ext)) if ext == ".txt"
    ));

    let empty = write_zip(&dir, "empty.zip", &[("notes.md", "# nothing")]);
    let err = ingestor.run(&source(&empty), "arrests").unwrap_err();
    assert!(matches!(err, IngestError::Load(LoaderError::EmptyArchive(_))));

    let store = TableStore::from_config(&cfg);
    assert!(store.list().unwrap().is_empty());
    assert!(matches!(
        store.describe("arrests"),
        Err(StoreError::TableNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_csv_is_downloaded_and_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/arrests.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARRESTS_CSV))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let url = format!("{}/resource/arrests.csv?$limit=50000", server.uri());

    let report = tokio::task::spawn_blocking(move || {
        Ingestor::from_config(&cfg).unwrap().run(&url, "arrests")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(report.rows, 2);
    assert_eq!(report.columns, ["arrest_date", "ofns_desc", "arrest_boro"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cfg = config(&dir).with_fetch_timeout_secs(5);
    let url = format!("{}/arrests.csv", server.uri());

    let err = tokio::task::spawn_blocking(move || {
        Ingestor::from_config(&cfg).unwrap().run(&url, "arrests")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, IngestError::Fetch(FetchError::Status { .. })));
    assert!(!err.is_not_found());
}
