//! Error types for database operations.
//!
//! Each failure class of the backend gets its own variant so callers can
//! tell a missing server from a bad predicate or a duplicate key.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The backend could not be reached or opened.
    #[error("connection error: {0}")]
    Connection(String),

    /// Table creation, removal or introspection failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// A select statement or its condition was rejected.
    #[error("query error: {0}")]
    Query(String),

    /// A row violated a table constraint (unique, not-null, foreign key, check).
    #[error("insert error: {0}")]
    Insert(String),

    /// A table or column name is not a plain identifier.
    #[error("invalid identifier '{0}': must start with a letter or underscore and contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),

    /// A value could not be converted to or from its stored form.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Convenience alias for results with [`DbError`].
pub type Result<T> = std::result::Result<T, DbError>;

/// Checks a table or column name before it is interpolated into SQL.
pub(crate) fn check_identifier(name: &str) -> Result<()> {
    if bbconf_core::is_identifier(name) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}
