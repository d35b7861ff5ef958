//! Row selection with optional parameter-bound conditions.
//!
//! A [`Condition`] is a SQL boolean fragment plus at most one value. The
//! value is always bound as a parameter, never spliced into the text, so
//! only the fragment itself has to be trusted.
//!
//! # Example
//!
//! ```no_run
//! use bbconf_sqlite::{Condition, Database};
//! use serde_json::json;
//!
//! let mut db = Database::in_memory();
//! db.create_bedbase_tables().unwrap();
//!
//! let cond = Condition::with_value("name = ?", json!("sample1"));
//! for row in db.select("bedfiles", Some(&["name", "md5sum"]), Some(&cond)).unwrap() {
//!     println!("{} {}", row["name"], row["md5sum"]);
//! }
//! ```

use std::collections::HashSet;

use rusqlite::ToSql;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tracing::debug;

use crate::connection::Database;
use crate::convert::{Row, collect_rows, to_sql_value};
use crate::error::{DbError, Result, check_identifier};

/// Placeholder marking where a condition's value is bound.
pub const PLACEHOLDER: char = '?';

/// A boolean SQL fragment with an optional bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Fragment placed after `WHERE`, e.g. `"name = ?"`.
    pub expression: String,
    /// Value bound to the single `?` in `expression`.
    pub value: Option<Value>,
}

impl Condition {
    /// A condition with no bound value, e.g. `"regions_no > 100"`.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            value: None,
        }
    }

    /// A condition whose single `?` is bound to `value`.
    pub fn with_value(expression: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            expression: expression.into(),
            value: Some(value.into()),
        }
    }

    /// Shorthand for `"{column} = ?"` bound to `value`.
    pub fn equals(column: &str, value: impl Into<Value>) -> Self {
        Self::with_value(format!("{column} = {PLACEHOLDER}"), value)
    }

    /// Checks the fragment and converts the value to its bindable form.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if the fragment is blank, if a value is
    /// given without exactly one placeholder, or if placeholders appear with
    /// no value.
    fn bind(&self) -> Result<Option<SqlValue>> {
        if self.expression.trim().is_empty() {
            return Err(DbError::Query("empty condition".to_string()));
        }
        let placeholders = count_placeholders(&self.expression);
        match (&self.value, placeholders) {
            (Some(value), 1) => Ok(Some(to_sql_value(value, false)?)),
            (Some(_), n) => Err(DbError::Query(format!(
                "condition '{}' has {n} placeholders, expected exactly 1 for the bound value",
                self.expression
            ))),
            (None, 0) => Ok(None),
            (None, n) => Err(DbError::Query(format!(
                "condition '{}' has {n} placeholders but no value",
                self.expression
            ))),
        }
    }
}

/// Counts `?` outside single-quoted string literals.
fn count_placeholders(expression: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in expression.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            PLACEHOLDER if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

fn projection(columns: Option<&[&str]>, alias: Option<&str>) -> Result<String> {
    let Some(columns) = columns.filter(|c| !c.is_empty()) else {
        return Ok(match alias {
            Some(a) => format!("{a}.*"),
            None => "*".to_string(),
        });
    };
    let mut parts = Vec::with_capacity(columns.len());
    for col in columns {
        check_identifier(col)?;
        parts.push(match alias {
            Some(a) => format!("{a}.{col} AS {col}"),
            None => (*col).to_string(),
        });
    }
    Ok(parts.join(", "))
}

impl Database {
    /// Selects rows from `table`, ordered by insertion.
    ///
    /// `columns` of `None` selects every column. Columns declared as JSON
    /// are decoded back into structured values. Rows of a `WITHOUT ROWID`
    /// table come back in primary-key order.
    ///
    /// # Errors
    ///
    /// - [`DbError::InvalidIdentifier`] for a malformed table or column name.
    /// - [`DbError::Query`] for a bad condition or a statement SQLite rejects.
    pub fn select(
        &mut self,
        table: &str,
        columns: Option<&[&str]>,
        condition: Option<&Condition>,
    ) -> Result<Vec<Row>> {
        check_identifier(table)?;
        let proj = projection(columns, None)?;
        let bound = condition.map(Condition::bind).transpose()?.flatten();

        let mut sql = format!("SELECT {proj} FROM {table}");
        if let Some(cond) = condition {
            sql.push_str(&format!(" WHERE {}", cond.expression));
        }
        if !self.is_without_rowid(table)? {
            sql.push_str(" ORDER BY rowid");
        }

        let json_columns = self.json_columns(table)?;
        debug!(%sql, "selecting rows");
        self.run_select(&sql, bound, &json_columns)
    }

    /// Selects bedfiles linked to any bedset matching `condition`.
    ///
    /// The condition is evaluated against the bedsets table alone (aliased
    /// `s`); naming a column bedsets does not have is a query error. Each
    /// matching bedfile is returned once, ordered by id, even when several
    /// matched bedsets share it. `related_columns` restricts the bedfile
    /// columns returned; `None` returns all of them.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use bbconf_sqlite::{Condition, Database};
    /// # let mut db = Database::in_memory();
    /// let cond = Condition::equals("name", "hg38_promoters");
    /// let beds = db.select_related(&cond, Some(&["name", "bedfile_path"])).unwrap();
    /// ```
    pub fn select_related(
        &mut self,
        condition: &Condition,
        related_columns: Option<&[&str]>,
    ) -> Result<Vec<Row>> {
        let tables = self.tables().clone();
        check_identifier(&tables.bed)?;
        check_identifier(&tables.bedset)?;
        check_identifier(&tables.relationship)?;

        let proj = projection(related_columns, Some("f"))?;
        let bound = condition.bind()?;

        // Prepared on its own so the fragment cannot resolve columns of the
        // bedfiles or relationship tables.
        let parent_sql = format!(
            "SELECT s.id FROM {bedset} AS s WHERE {expr}",
            bedset = tables.bedset,
            expr = condition.expression,
        );
        self.db_cursor(|tx| {
            tx.prepare(&parent_sql)
                .map(drop)
                .map_err(|e| DbError::Query(format!("{e}: {parent_sql}")))
        })?;

        let sql = format!(
            "SELECT {proj} FROM {bed} AS f \
             WHERE f.id IN (\
                SELECT r.{bed_key} FROM {rel} AS r \
                WHERE r.{bedset_key} IN (SELECT s.id FROM {bedset} AS s WHERE {expr})\
             ) ORDER BY f.id",
            bed = tables.bed,
            rel = tables.relationship,
            bedset = tables.bedset,
            bed_key = bbconf_core::columns::REL_BED_ID_KEY,
            bedset_key = bbconf_core::columns::REL_BEDSET_ID_KEY,
            expr = condition.expression,
        );

        let json_columns = self.json_columns(&tables.bed)?;
        debug!(%sql, "selecting related rows");
        self.run_select(&sql, bound, &json_columns)
    }

    fn run_select(
        &mut self,
        sql: &str,
        bound: Option<SqlValue>,
        json_columns: &HashSet<String>,
    ) -> Result<Vec<Row>> {
        self.db_cursor(|tx| {
            let mut stmt = tx
                .prepare(sql)
                .map_err(|e| DbError::Query(format!("{e}: {sql}")))?;
            let params: Vec<&dyn ToSql> = bound.iter().map(|v| v as &dyn ToSql).collect();
            collect_rows(&mut stmt, params.as_slice(), json_columns)
        })
    }
}
