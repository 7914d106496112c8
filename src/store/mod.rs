//! Single-file table store backed by SQLite.
//!
//! Every call opens its own connection to the configured database file; no
//! handle is kept between calls. A write replaces the named table wholesale.

mod convert;
mod sql;

pub use convert::Affinity;
pub use sql::{quote_identifier, quote_table_name};

use crate::config::WarehouseConfig;
use crate::data::column_names;
use convert::{any_to_json, column_to_sql, sql_to_column};
use polars::prelude::*;
use rayon::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Rows returned in a table description.
pub const SAMPLE_ROWS: usize = 5;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Invalid table or column name: {0:?}")]
    InvalidIdentifier(String),
    #[error("Cannot store table {0} without columns")]
    EmptySchema(String),
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Read-only summary of a stored table.
#[derive(Debug, Clone, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    /// First rows in storage order.
    #[serde(serialize_with = "serialize_rows")]
    pub sample: DataFrame,
}

fn serialize_rows<S: Serializer>(df: &DataFrame, serializer: S) -> Result<S::Ok, S::Error> {
    let names = column_names(df);
    let mut seq = serializer.serialize_seq(Some(df.height()))?;
    for row in 0..df.height() {
        let mut record = serde_json::Map::new();
        for (name, column) in names.iter().zip(df.get_columns()) {
            let value = column
                .get(row)
                .map(any_to_json)
                .unwrap_or(serde_json::Value::Null);
            record.insert(name.clone(), value);
        }
        seq.serialize_element(&record)?;
    }
    seq.end()
}

/// Persists named tables into one SQLite file.
#[derive(Debug, Clone)]
pub struct TableStore {
    db_path: PathBuf,
}

impl TableStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self::new(config.db_path.clone())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Replace table `name` with the contents of `df`.
    ///
    /// Drop, create and insert run in one transaction, so a failed write
    /// leaves the previous table in place.
    #[instrument(level = "debug", skip(self, df), fields(rows = df.height()))]
    pub fn write(&self, name: &str, df: &DataFrame) -> Result<(), StoreError> {
        let table = quote_table_name(name)?;
        if df.width() == 0 {
            return Err(StoreError::EmptySchema(name.to_string()));
        }

        let definitions = df
            .get_columns()
            .iter()
            .map(|column| {
                let affinity = Affinity::for_dtype(column.dtype());
                Ok(format!("{} {}", quote_identifier(column.name())?, affinity.sql_name()))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let values: Vec<Vec<Value>> = df
            .get_columns()
            .par_iter()
            .map(column_to_sql)
            .collect::<PolarsResult<_>>()?;

        let placeholders = (1..=df.width())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
        tx.execute(
            &format!("CREATE TABLE {table} ({})", definitions.join(", ")),
            [],
        )?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
            for row in 0..df.height() {
                stmt.execute(params_from_iter(values.iter().map(|column| &column[row])))?;
            }
        }
        tx.commit()?;

        info!(table = %name, rows = df.height(), columns = df.width(), db = %self.db_path.display(), "stored table");
        Ok(())
    }

    /// Names of all user tables, in catalog order.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    /// Row count, column names and the first rows of a table.
    pub fn describe(&self, name: &str) -> Result<TableDescription, StoreError> {
        let table = quote_table_name(name)?;
        let conn = self.connect()?;
        let Some(stored) = stored_name(&conn, name)? else {
            return Err(StoreError::TableNotFound(name.to_string()));
        };

        let row_count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        let sample = query_frame(
            &conn,
            &stored,
            &format!("SELECT * FROM {table} LIMIT {SAMPLE_ROWS}"),
        )?;

        Ok(TableDescription {
            name: stored,
            row_count: row_count as usize,
            columns: column_names(&sample),
            sample,
        })
    }

    /// The whole table as a DataFrame.
    pub fn read(&self, name: &str) -> Result<DataFrame, StoreError> {
        let table = quote_table_name(name)?;
        let conn = self.connect()?;
        let Some(stored) = stored_name(&conn, name)? else {
            return Err(StoreError::TableNotFound(name.to_string()));
        };
        let df = query_frame(&conn, &stored, &format!("SELECT * FROM {table}"))?;
        debug!(table = %name, rows = df.height(), "read table");
        Ok(df)
    }
}

/// Catalog spelling of table `name`. SQLite identifiers ignore ASCII case.
fn stored_name(conn: &Connection, name: &str) -> Result<Option<String>, StoreError> {
    let stored = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(stored)
}

/// Run `sql` against table `name` and collect the result column by column.
fn query_frame(conn: &Connection, name: &str, sql: &str) -> Result<DataFrame, StoreError> {
    let declared: Vec<(String, String)> = conn
        .prepare("SELECT name, type FROM pragma_table_info(?1)")?
        .query_map([name], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(sql)?;
    let mut values: Vec<Vec<Value>> = vec![Vec::new(); declared.len()];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (i, column) in values.iter_mut().enumerate() {
            column.push(row.get::<_, Value>(i)?);
        }
    }

    let columns = declared
        .iter()
        .zip(values)
        .map(|((column, decl), data)| sql_to_column(column, decl, data))
        .collect::<Vec<_>>();
    Ok(DataFrame::new(columns)?)
}
