//! Parameterized row inserts.

use rusqlite::types::Value as SqlValue;
use rusqlite::{ErrorCode, params_from_iter};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::connection::Database;
use crate::convert::{Row, to_sql_value};
use crate::error::{DbError, Result, check_identifier};

fn numbered_marks(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// Maps constraint violations to [`DbError::Insert`].
fn classify_insert_error(table: &str, err: rusqlite::Error) -> DbError {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        DbError::Insert(format!("{table}: {err}"))
    } else {
        DbError::Database(err)
    }
}

impl Database {
    /// Inserts one row into `table` and returns its row id.
    ///
    /// Keys of `values` are column names. Objects and arrays are stored as
    /// JSON text, as is every non-null value bound for a `JSON`/`JSONB`
    /// column. An empty map inserts a row of column defaults.
    ///
    /// # Errors
    ///
    /// - [`DbError::InvalidIdentifier`] for a malformed table or column name.
    /// - [`DbError::Insert`] if the row violates a unique, not-null, foreign
    ///   key or check constraint.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bbconf_sqlite::Database;
    /// use serde_json::json;
    ///
    /// let mut db = Database::in_memory();
    /// db.create_table("bedfiles", ["id INTEGER PRIMARY KEY", "name TEXT NOT NULL"]).unwrap();
    ///
    /// let row = json!({"name": "x"});
    /// let id = db.insert_row("bedfiles", row.as_object().unwrap()).unwrap();
    /// assert_eq!(id, 1);
    /// ```
    pub fn insert_row(&mut self, table: &str, values: &Row) -> Result<i64> {
        let (columns, params) = self.bind_row(table, values)?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                columns.join(", "),
                numbered_marks(columns.len())
            )
        };
        debug!(%sql, "inserting row");

        self.db_cursor(|tx| {
            tx.execute(&sql, params_from_iter(params.iter()))
                .map_err(|e| classify_insert_error(table, e))?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Inserts one row, or updates the existing row whose `key_column`
    /// matches, and returns the row id either way.
    ///
    /// `key_column` must carry a unique or primary key constraint. On
    /// conflict every other column in `values` is overwritten; columns not
    /// named in `values` keep their stored value.
    ///
    /// # Errors
    ///
    /// - [`DbError::InvalidIdentifier`] for a malformed table or column name.
    /// - [`DbError::Insert`] if `values` has no `key_column`, or the row
    ///   violates a not-null, foreign key or check constraint.
    /// - [`DbError::Database`] if `key_column` is not unique.
    pub fn insert_or_update_row(
        &mut self,
        table: &str,
        values: &Row,
        key_column: &str,
    ) -> Result<i64> {
        check_identifier(key_column)?;
        if !values.contains_key(key_column) {
            return Err(DbError::Insert(format!(
                "{table}: upsert key '{key_column}' missing from row"
            )));
        }
        let (columns, params) = self.bind_row(table, values)?;

        let mut updates: Vec<String> = columns
            .iter()
            .filter(|c| **c != key_column)
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        if updates.is_empty() {
            updates.push(format!("{key_column} = excluded.{key_column}"));
        }
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT({key_column}) DO UPDATE SET {} RETURNING rowid",
            columns.join(", "),
            numbered_marks(columns.len()),
            updates.join(", ")
        );
        debug!(%sql, "upserting row");

        self.db_cursor(|tx| {
            tx.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
                .map_err(|e| classify_insert_error(table, e))
        })
    }

    /// Validates names and converts `values` to bindable parameters, using
    /// the declared column types of `table`.
    fn bind_row<'a>(
        &mut self,
        table: &str,
        values: &'a Row,
    ) -> Result<(Vec<&'a str>, Vec<SqlValue>)> {
        check_identifier(table)?;
        let json_columns = self.json_columns(table)?;
        let mut columns = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (column, value) in values {
            check_identifier(column)?;
            columns.push(column.as_str());
            params.push(to_sql_value(value, json_columns.contains(column))?);
        }
        Ok((columns, params))
    }

    /// Serializes `record` to a JSON object and inserts it into `table`.
    ///
    /// `None` fields become SQL `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Insert`] if `record` does not serialize to an
    /// object, plus everything [`insert_row`](Self::insert_row) returns.
    pub fn insert_record<T: Serialize>(&mut self, table: &str, record: &T) -> Result<i64> {
        match serde_json::to_value(record)? {
            Value::Object(map) => self.insert_row(table, &map),
            other => Err(DbError::Insert(format!(
                "{table}: expected a record with named fields, got {other}"
            ))),
        }
    }

    /// Inserts one link into the bedset/bedfile relationship table.
    pub fn insert_link_row(&mut self, values: &Row) -> Result<()> {
        let table = self.tables().relationship.clone();
        self.insert_row(&table, values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_insert_returns_sequential_ids() {
        let mut db = Database::in_memory();
        db.create_table("t", ["id INTEGER PRIMARY KEY AUTOINCREMENT", "name TEXT"])
            .unwrap();
        assert_eq!(db.insert_row("t", &object(json!({"name": "a"}))).unwrap(), 1);
        assert_eq!(db.insert_row("t", &object(json!({"name": "b"}))).unwrap(), 2);
        assert_eq!(db.count_rows("t").unwrap(), 2);
    }

    #[test]
    fn test_insert_empty_map_uses_defaults() {
        let mut db = Database::in_memory();
        db.create_table("t", ["id INTEGER PRIMARY KEY", "state TEXT DEFAULT 'new'"])
            .unwrap();
        db.insert_row("t", &Row::new()).unwrap();
        let rows = db.select("t", Some(&["state"]), None).unwrap();
        assert_eq!(rows[0]["state"], json!("new"));
    }

    #[test]
    fn test_insert_documents_round_trip() {
        let mut db = Database::in_memory();
        db.create_table("t", ["id INTEGER PRIMARY KEY", "name TEXT", "plots JSONB"])
            .unwrap();
        let row = object(json!({"name": "a", "plots": [{"name": "tss"}]}));
        db.insert_row("t", &row).unwrap();

        let rows = db.select("t", Some(&["name", "plots"]), None).unwrap();
        assert_eq!(rows[0], row);
    }

    #[test]
    fn test_unique_violation_is_insert_error() {
        let mut db = Database::in_memory();
        db.create_table("t", ["md5sum TEXT UNIQUE"]).unwrap();
        let row = object(json!({"md5sum": "abc"}));
        db.insert_row("t", &row).unwrap();
        assert!(matches!(db.insert_row("t", &row), Err(DbError::Insert(_))));
        assert_eq!(db.count_rows("t").unwrap(), 1);
    }

    #[test]
    fn test_not_null_violation_is_insert_error() {
        let mut db = Database::in_memory();
        db.create_table("t", ["name TEXT NOT NULL"]).unwrap();
        assert!(matches!(
            db.insert_row("t", &object(json!({"name": null}))),
            Err(DbError::Insert(_))
        ));
    }

    #[test]
    fn test_foreign_key_violation_is_insert_error() {
        let mut db = Database::in_memory();
        db.create_bedbase_tables().unwrap();
        let link = object(json!({"bedfile_id": 7, "bedset_id": 9}));
        assert!(matches!(db.insert_link_row(&link), Err(DbError::Insert(_))));
    }

    #[test]
    fn test_unknown_column_is_database_error() {
        let mut db = Database::in_memory();
        db.create_table("t", ["name TEXT"]).unwrap();
        assert!(matches!(
            db.insert_row("t", &object(json!({"nope": 1}))),
            Err(DbError::Database(_))
        ));
    }

    #[test]
    fn test_insert_record() {
        #[derive(Serialize)]
        struct Bed<'a> {
            name: &'a str,
            regions_no: Option<i64>,
        }

        let mut db = Database::in_memory();
        db.create_table("t", ["name TEXT", "regions_no INTEGER"]).unwrap();
        db.insert_record("t", &Bed { name: "a", regions_no: None }).unwrap();
        let rows = db.select("t", None, None).unwrap();
        assert_eq!(rows[0]["regions_no"], Value::Null);

        assert!(matches!(
            db.insert_record("t", &"scalar"),
            Err(DbError::Insert(_))
        ));
    }

    #[test]
    fn test_insert_round_trip_follows_column_affinity() {
        let mut db = Database::in_memory();
        db.create_table(
            "t",
            ["id INTEGER PRIMARY KEY", "gc_content FLOAT", "flag JSONB", "label JSONB"],
        )
        .unwrap();
        let row = object(json!({"gc_content": 1, "flag": true, "label": "123"}));
        db.insert_row("t", &row).unwrap();

        let rows = db
            .select("t", Some(&["gc_content", "flag", "label"]), None)
            .unwrap();
        assert_eq!(rows[0]["gc_content"], json!(1.0));
        assert_eq!(rows[0]["flag"], json!(true));
        assert_eq!(rows[0]["label"], json!("123"));
    }

    #[test]
    fn test_insert_or_update_replaces_on_key() {
        let mut db = Database::in_memory();
        db.create_table(
            "t",
            ["id INTEGER PRIMARY KEY", "md5sum TEXT UNIQUE", "name TEXT", "plots JSONB"],
        )
        .unwrap();
        let first = object(json!({"md5sum": "abc", "name": "a", "plots": [1]}));
        let id = db.insert_or_update_row("t", &first, "md5sum").unwrap();
        assert_eq!(id, 1);
        assert!(matches!(db.insert_row("t", &first), Err(DbError::Insert(_))));

        let second = object(json!({"md5sum": "abc", "name": "b"}));
        assert_eq!(db.insert_or_update_row("t", &second, "md5sum").unwrap(), id);
        assert_eq!(db.count_rows("t").unwrap(), 1);

        let rows = db.select("t", Some(&["name", "plots"]), None).unwrap();
        assert_eq!(rows[0]["name"], json!("b"));
        assert_eq!(rows[0]["plots"], json!([1]));

        let other = object(json!({"md5sum": "def"}));
        assert_eq!(db.insert_or_update_row("t", &other, "md5sum").unwrap(), 2);
    }

    #[test]
    fn test_insert_or_update_requires_key() {
        let mut db = Database::in_memory();
        db.create_table("t", ["md5sum TEXT UNIQUE", "name TEXT"]).unwrap();
        assert!(matches!(
            db.insert_or_update_row("t", &object(json!({"name": "a"})), "md5sum"),
            Err(DbError::Insert(_))
        ));
        assert!(matches!(
            db.insert_or_update_row("t", &object(json!({"name": "a"})), "name"),
            Err(DbError::Database(_))
        ));
    }
}
