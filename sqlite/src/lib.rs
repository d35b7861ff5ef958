//! SQLite storage backend for BEDbase.
//!
//! Stores bedfile and bedset metadata, plus the links between them, in an
//! embedded SQLite database. Rows are exchanged as ordered JSON objects so
//! pipeline outputs can be inserted without a typed model per table.
//!
//! # Architecture
//!
//! The crate is organized into five modules:
//!
//! - **`connection`**: [`Database`] handle lifecycle and scoped transactions
//! - **`schema`**: table creation, removal and introspection
//! - **`query`**: row selection with parameter-bound [`Condition`]s
//! - **`mutation`**: parameterized inserts
//! - **`convert`**: mapping between JSON and SQLite values
//!
//! # Quick start
//!
//! ```no_run
//! use bbconf_core::DatabaseSettings;
//! use bbconf_sqlite::{Condition, Database};
//! use serde_json::json;
//!
//! let settings = DatabaseSettings {
//!     name: "bedbase.sqlite".to_string(),
//!     ..DatabaseSettings::default()
//! };
//! let mut db = Database::new(&settings, None);
//! db.establish_connection(false).unwrap();
//! db.create_bedbase_tables().unwrap();
//!
//! let bed = json!({"name": "sample1", "md5sum": "abc", "bedfile_path": "/data/sample1.bed"});
//! db.insert_row("bedfiles", bed.as_object().unwrap()).unwrap();
//!
//! let rows = db.select("bedfiles", None, Some(&Condition::equals("md5sum", "abc"))).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```
//!
//! # Identifiers
//!
//! Table and column names are interpolated into SQL and must start with a
//! letter or underscore and contain only alphanumeric characters and
//! underscores. Anything else fails with [`DbError::InvalidIdentifier`].

mod connection;
mod convert;
mod error;
mod mutation;
mod query;
mod schema;

pub use connection::{ConnectionTarget, Database, MEMORY_DATABASE, TableNames};
pub use convert::Row;
pub use error::{DbError, Result};
pub use query::{Condition, PLACEHOLDER};
pub use schema::ColumnDefs;
