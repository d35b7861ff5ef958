//! Conversion between JSON values and SQLite storage classes.
//!
//! Rows cross the crate boundary as ordered JSON objects ([`Row`]). On the
//! way in, values bound for columns declared `JSON`/`JSONB` are stored as
//! JSON text, scalars included, and are decoded again on the way out. Other
//! columns get the natural storage class of the value, with arrays and
//! objects stored as JSON text.
//!
//! Numbers follow SQLite column affinity: a `FLOAT` (REAL affinity) column
//! returns every number as a float, and a `JSONB` (NUMERIC affinity) column
//! returns whole-valued floats as integers. Booleans outside JSON columns
//! are stored as `0`/`1`.

use std::collections::HashSet;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Params, Statement};
use serde_json::{Map, Number, Value};

use crate::error::Result;

/// One result row: column name to value, in projection order.
pub type Row = Map<String, Value>;

/// Returns `true` if a declared column type holds JSON documents.
pub(crate) fn is_json_type(declared: &str) -> bool {
    declared.trim().to_ascii_uppercase().starts_with("JSON")
}

/// Converts a JSON value to a bindable SQLite value.
///
/// `json_column` stores any non-null value as JSON text.
pub(crate) fn to_sql_value(value: &Value, json_column: bool) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        _ if json_column => SqlValue::Text(serde_json::to_string(value)?),
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(serde_json::to_string(value)?),
    })
}

/// Converts a stored SQLite value back to JSON.
///
/// `json_column` decodes text as a JSON document, falling back to a plain
/// string when the text does not parse.
pub(crate) fn from_sql_value(value: ValueRef<'_>, json_column: bool) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if json_column {
                if let Ok(parsed) = serde_json::from_str(&text) {
                    return parsed;
                }
            }
            Value::String(text.into_owned())
        }
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Runs a prepared statement and collects every result row.
pub(crate) fn collect_rows<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
    json_columns: &HashSet<String>,
) -> Result<Vec<Row>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let flags: Vec<bool> = names.iter().map(|n| json_columns.contains(n)).collect();

    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, name) in names.iter().enumerate() {
            record.insert(name.clone(), from_sql_value(row.get_ref(idx)?, flags[idx]));
        }
        out.push(record);
    }
    Ok(out)
}
