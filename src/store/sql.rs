//! Identifier quoting for SQLite statements.
//!
//! Table and column names can't be bound as parameters, so every name that
//! reaches a statement goes through here first.

use super::StoreError;

/// Quote a column name as a SQLite identifier.
pub fn quote_identifier(name: &str) -> Result<String, StoreError> {
    if name.is_empty() || name.contains('\0') {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a table name. Names in SQLite's reserved `sqlite_` namespace are refused.
pub fn quote_table_name(name: &str) -> Result<String, StoreError> {
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    quote_identifier(name)
}
