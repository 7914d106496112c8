//! Conversions between Polars values and SQLite values.

use polars::prelude::*;
use rusqlite::types::Value;

/// Storage class a column is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Real,
    Text,
}

impl Affinity {
    pub fn for_dtype(dtype: &DataType) -> Self {
        if dtype.is_integer() || matches!(dtype, DataType::Boolean) {
            Affinity::Integer
        } else if dtype.is_float() {
            Affinity::Real
        } else {
            Affinity::Text
        }
    }

    /// SQLite's type-name rules, reduced to the three classes we write.
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") {
            Affinity::Integer
        } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB")
        {
            Affinity::Real
        } else {
            Affinity::Text
        }
    }

    pub fn sql_name(self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Real => "REAL",
            Affinity::Text => "TEXT",
        }
    }
}

/// Convert every cell of a column into a SQLite value.
pub fn column_to_sql(column: &Column) -> PolarsResult<Vec<Value>> {
    (0..column.len())
        .map(|i| column.get(i).map(any_to_sql))
        .collect()
}

fn any_to_sql(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Integer(b as i64),
        AnyValue::Int8(v) => Value::Integer(v as i64),
        AnyValue::Int16(v) => Value::Integer(v as i64),
        AnyValue::Int32(v) => Value::Integer(v as i64),
        AnyValue::Int64(v) => Value::Integer(v),
        AnyValue::UInt8(v) => Value::Integer(v as i64),
        AnyValue::UInt16(v) => Value::Integer(v as i64),
        AnyValue::UInt32(v) => Value::Integer(v as i64),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Real(v as f64),
        },
        AnyValue::Float32(v) if v.is_nan() => Value::Null,
        AnyValue::Float32(v) => Value::Real(v as f64),
        AnyValue::Float64(v) if v.is_nan() => Value::Null,
        AnyValue::Float64(v) => Value::Real(v),
        AnyValue::String(s) => Value::Text(s.to_string()),
        AnyValue::StringOwned(s) => Value::Text(s.to_string()),
        other => Value::Text(other.to_string()),
    }
}

/// Build a Polars column from values read back out of SQLite.
///
/// Dynamic typing means a column can hold mixed storage classes: all-integer
/// columns become Int64, all-numeric Float64, anything else String. A column
/// without any non-null value falls back to its declared type.
pub fn sql_to_column(name: &str, declared: &str, values: Vec<Value>) -> Column {
    let has_values = values.iter().any(|v| !matches!(v, Value::Null));
    let affinity = if !has_values {
        Affinity::from_declared(declared)
    } else if values
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Integer(_)))
    {
        Affinity::Integer
    } else if values
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Integer(_) | Value::Real(_)))
    {
        Affinity::Real
    } else {
        Affinity::Text
    };

    match affinity {
        Affinity::Integer => {
            let data: Vec<Option<i64>> = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        Affinity::Real => {
            let data: Vec<Option<f64>> = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i as f64),
                    Value::Real(f) => Some(f),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        Affinity::Text => {
            let data: Vec<Option<String>> = values.into_iter().map(value_to_text).collect();
            Column::new(name.into(), data)
        }
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Render a cell as JSON for machine-readable output.
pub fn any_to_json(value: AnyValue<'_>) -> serde_json::Value {
    match any_to_sql(value) {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(i),
        Value::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Blob(b) => serde_json::Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_from_dtypes() {
        assert_eq!(Affinity::for_dtype(&DataType::Int32), Affinity::Integer);
        assert_eq!(Affinity::for_dtype(&DataType::Boolean), Affinity::Integer);
        assert_eq!(Affinity::for_dtype(&DataType::Float64), Affinity::Real);
        assert_eq!(Affinity::for_dtype(&DataType::String), Affinity::Text);
        assert_eq!(Affinity::for_dtype(&DataType::Date), Affinity::Text);
    }

    #[test]
    fn affinity_from_declared_types() {
        assert_eq!(Affinity::from_declared("BIGINT"), Affinity::Integer);
        assert_eq!(Affinity::from_declared("double precision"), Affinity::Real);
        assert_eq!(Affinity::from_declared(""), Affinity::Text);
    }

    #[test]
    fn nulls_and_nans_become_sql_null() {
        let column = Column::new("v".into(), [Some(1.5f64), None, Some(f64::NAN)]);
        let values = column_to_sql(&column).unwrap();
        assert_eq!(values, [Value::Real(1.5), Value::Null, Value::Null]);
    }

    #[test]
    fn mixed_storage_classes_fall_back_to_text() {
        let column = sql_to_column(
            "c",
            "INTEGER",
            vec![Value::Integer(1), Value::Text("x".into()), Value::Null],
        );
        assert_eq!(column.dtype(), &DataType::String);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn integers_and_reals_widen_to_float() {
        let column = sql_to_column("c", "REAL", vec![Value::Integer(1), Value::Real(2.5)]);
        assert_eq!(column.dtype(), &DataType::Float64);
    }

    #[test]
    fn empty_column_uses_declared_type() {
        let column = sql_to_column("c", "INTEGER", vec![Value::Null, Value::Null]);
        assert_eq!(column.dtype(), &DataType::Int64);
        assert_eq!(column.len(), 2);
    }

    #[test]
    fn json_rendering() {
        assert_eq!(any_to_json(AnyValue::Int32(3)), serde_json::json!(3));
        assert_eq!(any_to_json(AnyValue::String("B")), serde_json::json!("B"));
        assert_eq!(any_to_json(AnyValue::Null), serde_json::Value::Null);
    }
}
