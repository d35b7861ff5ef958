//! Table creation, removal and introspection.
//!
//! Table and column names are interpolated into SQL, so every table name is
//! checked with [`check_identifier`](crate::error::check_identifier) first.
//! Column definitions are passed through verbatim; they come from the
//! caller's own code, not from user input.

use std::collections::HashSet;
use std::fmt;

use rusqlite::OptionalExtension;
use tracing::{debug, info};

use crate::connection::Database;
use crate::convert::is_json_type;
use crate::error::{DbError, Result, check_identifier};

/// Column definitions for a `CREATE TABLE` statement.
///
/// Accepts either one pre-joined string (`"a INTEGER, b TEXT"`) or a list of
/// individual definitions, which are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefs(Vec<String>);

impl ColumnDefs {
    /// Returns `true` if no non-blank definition is present.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|c| c.trim().is_empty())
    }

    fn joined(&self) -> String {
        self.0
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ColumnDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for ColumnDefs {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for ColumnDefs {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for ColumnDefs {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for ColumnDefs {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for ColumnDefs {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnDefs {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

impl Database {
    /// Creates `table` with the given column definitions.
    ///
    /// # Errors
    ///
    /// - [`DbError::InvalidIdentifier`] if the table name is not a plain
    ///   identifier.
    /// - [`DbError::Schema`] if no columns are given, a table of that name
    ///   already exists, or the definitions are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bbconf_sqlite::Database;
    /// let mut db = Database::in_memory();
    /// db.create_table("bedfiles", ["id INTEGER PRIMARY KEY", "name VARCHAR(50) NOT NULL"])
    ///     .unwrap();
    /// assert!(db.table_exists("bedfiles").unwrap());
    /// ```
    pub fn create_table(&mut self, table: &str, columns: impl Into<ColumnDefs>) -> Result<()> {
        check_identifier(table)?;
        let columns = columns.into();
        if columns.is_empty() {
            return Err(DbError::Schema(format!(
                "no columns given for table '{table}'"
            )));
        }

        let sql = format!("CREATE TABLE {table} ({columns})");
        debug!(%sql, "creating table");
        self.db_cursor(|tx| {
            tx.execute_batch(&sql)
                .map_err(|e| DbError::Schema(format!("cannot create table '{table}': {e}")))
        })?;
        info!(table, "created table");
        Ok(())
    }

    /// Drops `table` if it exists. Dropping an absent table is not an error.
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        check_identifier(table)?;
        let sql = format!("DROP TABLE IF EXISTS {table}");
        self.db_cursor(|tx| {
            tx.execute_batch(&sql)
                .map_err(|e| DbError::Schema(format!("cannot drop table '{table}': {e}")))
        })?;
        info!(table, "dropped table");
        Ok(())
    }

    /// Returns `true` if a table named `table` exists.
    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        check_identifier(table)?;
        self.db_cursor(|tx| {
            let found = tx
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Returns `(column name, declared type)` pairs in table order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Schema`] if the table does not exist.
    pub fn table_column_types(&mut self, table: &str) -> Result<Vec<(String, String)>> {
        check_identifier(table)?;
        let columns = self.db_cursor(|tx| {
            let mut stmt =
                tx.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
            let rows = stmt.query_map([table], |row| Ok((row.get(0)?, row.get(1)?)))?;
            Ok(rows.collect::<std::result::Result<Vec<(String, String)>, _>>()?)
        })?;
        if columns.is_empty() {
            return Err(DbError::Schema(format!("table '{table}' does not exist")));
        }
        Ok(columns)
    }

    /// Counts the rows in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Schema`] if the table does not exist.
    pub fn count_rows(&mut self, table: &str) -> Result<u64> {
        check_identifier(table)?;
        if !self.table_exists(table)? {
            return Err(DbError::Schema(format!("table '{table}' does not exist")));
        }
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.db_cursor(|tx| Ok(tx.query_row(&sql, [], |r| r.get(0))?))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Names of the columns of `table` declared with a JSON type.
    ///
    /// An absent table has none; the statement that uses the table reports
    /// it missing.
    pub(crate) fn json_columns(&mut self, table: &str) -> Result<HashSet<String>> {
        self.db_cursor(|tx| {
            let mut stmt = tx.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
            let rows = stmt.query_map([table], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            let mut names = HashSet::new();
            for row in rows {
                let (name, ty) = row?;
                if is_json_type(&ty) {
                    names.insert(name);
                }
            }
            Ok(names)
        })
    }

    /// Returns `true` if `table` was created `WITHOUT ROWID`.
    pub(crate) fn is_without_rowid(&mut self, table: &str) -> Result<bool> {
        self.db_cursor(|tx| {
            let flag: Option<i64> = tx
                .query_row(
                    "SELECT wr FROM pragma_table_list WHERE name = ?1 LIMIT 1",
                    [table],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(flag.unwrap_or(0) != 0)
        })
    }

    /// Creates the bedfiles, bedsets and relationship tables with the
    /// default BEDbase columns, skipping any that already exist.
    pub fn create_bedbase_tables(&mut self) -> Result<()> {
        let tables = self.tables().clone();
        if !self.table_exists(&tables.bed)? {
            self.create_table(&tables.bed, bbconf_core::columns::bed_columns())?;
        }
        if !self.table_exists(&tables.bedset)? {
            self.create_table(&tables.bedset, bbconf_core::columns::bedset_columns())?;
        }
        if !self.table_exists(&tables.relationship)? {
            self.create_table(
                &tables.relationship,
                bbconf_core::columns::relationship_columns(&tables.bed, &tables.bedset),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_defs_join() {
        assert_eq!(ColumnDefs::from("a INTEGER").to_string(), "a INTEGER");
        assert_eq!(
            ColumnDefs::from(["a INTEGER", "b TEXT"]).to_string(),
            "a INTEGER, b TEXT"
        );
        assert_eq!(
            ColumnDefs::from(vec!["a INTEGER".to_string(), "  ".to_string()]).to_string(),
            "a INTEGER"
        );
        assert!(ColumnDefs::from(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_create_and_exists() {
        let mut db = Database::in_memory();
        assert!(!db.table_exists("bedfiles").unwrap());
        db.create_table("bedfiles", "name VARCHAR(50) NOT NULL").unwrap();
        assert!(db.table_exists("bedfiles").unwrap());
    }

    #[test]
    fn test_create_duplicate_is_schema_error() {
        let mut db = Database::in_memory();
        db.create_table("t", ["x INTEGER"]).unwrap();
        assert!(matches!(
            db.create_table("t", ["x INTEGER"]),
            Err(DbError::Schema(_))
        ));
    }

    #[test]
    fn test_create_without_columns_is_schema_error() {
        let mut db = Database::in_memory();
        assert!(matches!(
            db.create_table("t", Vec::<String>::new()),
            Err(DbError::Schema(_))
        ));
        assert!(!db.table_exists("t").unwrap());
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let mut db = Database::in_memory();
        assert!(matches!(
            db.create_table("t; DROP TABLE x", ["x INTEGER"]),
            Err(DbError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            db.drop_table("bad-name"),
            Err(DbError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_drop_absent_table_is_ok() {
        let mut db = Database::in_memory();
        db.drop_table("missing").unwrap();
        db.create_table("t", ["x INTEGER"]).unwrap();
        db.drop_table("t").unwrap();
        db.drop_table("t").unwrap();
        assert!(!db.table_exists("t").unwrap());
    }

    #[test]
    fn test_column_types_in_order() {
        let mut db = Database::in_memory();
        db.create_table("t", ["id INTEGER PRIMARY KEY", "name VARCHAR(50)", "plots JSONB"])
            .unwrap();
        let types = db.table_column_types("t").unwrap();
        assert_eq!(
            types,
            vec![
                ("id".to_string(), "INTEGER".to_string()),
                ("name".to_string(), "VARCHAR(50)".to_string()),
                ("plots".to_string(), "JSONB".to_string()),
            ]
        );
    }

    #[test]
    fn test_column_types_of_missing_table() {
        let mut db = Database::in_memory();
        assert!(matches!(
            db.table_column_types("missing"),
            Err(DbError::Schema(_))
        ));
    }

    #[test]
    fn test_count_rows() {
        let mut db = Database::in_memory();
        db.create_table("t", ["x INTEGER"]).unwrap();
        assert_eq!(db.count_rows("t").unwrap(), 0);
        assert!(matches!(db.count_rows("missing"), Err(DbError::Schema(_))));
    }

    #[test]
    fn test_json_columns_by_declared_type() {
        let mut db = Database::in_memory();
        db.create_table("t", ["name TEXT", "plots JSONB", "other json"]).unwrap();
        let names = db.json_columns("t").unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("plots"));
        assert!(names.contains("other"));
        assert!(db.json_columns("missing").unwrap().is_empty());
    }

    #[test]
    fn test_without_rowid_detection() {
        let mut db = Database::in_memory();
        db.create_table("plain", ["x INTEGER"]).unwrap();
        db.db_cursor(|tx| {
            Ok(tx.execute_batch("CREATE TABLE keyed (k TEXT PRIMARY KEY, v TEXT) WITHOUT ROWID")?)
        })
        .unwrap();
        assert!(!db.is_without_rowid("plain").unwrap());
        assert!(db.is_without_rowid("keyed").unwrap());
    }

    #[test]
    fn test_create_bedbase_tables_is_repeatable() {
        let mut db = Database::in_memory();
        db.create_bedbase_tables().unwrap();
        db.create_bedbase_tables().unwrap();
        assert!(db.table_exists("bedfiles").unwrap());
        assert!(db.table_exists("bedsets").unwrap());
        assert!(db.table_exists("bedset_bedfiles").unwrap());
    }
}
