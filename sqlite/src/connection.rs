//! Connection lifecycle for the SQLite backend.
//!
//! A [`Database`] owns at most one live [`Connection`]. It starts out
//! disconnected; the first operation (or an explicit
//! [`establish_connection`](Database::establish_connection)) opens the
//! handle, and [`close_connection`](Database::close_connection) drops it.
//!
//! # Example
//!
//! ```no_run
//! use bbconf_core::DatabaseSettings;
//! use bbconf_sqlite::Database;
//!
//! let settings = DatabaseSettings {
//!     name: "bedbase.sqlite".to_string(),
//!     ..DatabaseSettings::default()
//! };
//! let mut db = Database::new(&settings, None);
//!
//! assert!(!db.check_connection());
//! assert!(db.establish_connection(false).unwrap());
//! assert!(db.check_connection());
//!
//! db.close_connection().unwrap();
//! assert!(!db.check_connection());
//! ```
//!
//! # Threading
//!
//! `Database` is `Send` but not `Sync`. Sharing one instance across threads
//! needs external synchronization; one instance per thread is simpler.

use std::fmt;
use std::path::{Path, PathBuf};

use bbconf_core::DatabaseSettings;
use rusqlite::{Connection, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, Result};

/// Database name that selects a private in-memory database.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Names of the three BEDbase tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub bed: String,
    pub bedset: String,
    pub relationship: String,
}

impl From<&DatabaseSettings> for TableNames {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            bed: settings.bed_table.clone(),
            bedset: settings.bedset_table.clone(),
            relationship: settings.relationship_table.clone(),
        }
    }
}

/// Where the connection points once host and name are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// A private in-memory database, gone when the handle closes.
    Memory,
    /// A database file on the local filesystem.
    File(PathBuf),
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_DATABASE),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Handle to the BEDbase tables, with a lazily established connection.
pub struct Database {
    settings: DatabaseSettings,
    base_dir: Option<PathBuf>,
    tables: TableNames,
    conn: Option<Connection>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("settings", &self.settings)
            .field("base_dir", &self.base_dir)
            .field("tables", &self.tables)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

impl Database {
    /// Creates a disconnected handle.
    ///
    /// A relative database name is resolved against `base_dir`, normally the
    /// directory holding the config file.
    pub fn new(settings: &DatabaseSettings, base_dir: Option<&Path>) -> Self {
        Self {
            settings: settings.clone(),
            base_dir: base_dir.map(Path::to_path_buf),
            tables: TableNames::from(settings),
            conn: None,
        }
    }

    /// Creates a disconnected handle to a private in-memory database with
    /// the default table names.
    pub fn in_memory() -> Self {
        let settings = DatabaseSettings {
            name: MEMORY_DATABASE.to_string(),
            ..DatabaseSettings::default()
        };
        Self::new(&settings, None)
    }

    /// Returns the configured table names.
    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Resolves the configured host and database name to a target.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the host is not the local machine;
    /// an embedded database cannot be reached over the network.
    pub fn target(&self) -> Result<ConnectionTarget> {
        if !is_local_host(&self.settings.host) {
            return Err(DbError::Connection(format!(
                "cannot reach host '{}': SQLite databases are only served from the local machine",
                self.settings.host
            )));
        }
        if self.settings.name == MEMORY_DATABASE {
            return Ok(ConnectionTarget::Memory);
        }
        let path = PathBuf::from(&self.settings.name);
        let path = match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        };
        Ok(ConnectionTarget::File(path))
    }

    /// Describes the connection target with the password redacted.
    pub fn connection_description(&self) -> String {
        let target = self
            .target()
            .map(|t| t.to_string())
            .unwrap_or_else(|_| self.settings.name.clone());
        format!(
            "{}:***@{}:{}/{}",
            self.settings.user, self.settings.host, self.settings.port, target
        )
    }

    /// Opens the connection if none is open.
    ///
    /// Returns `Ok(true)` once a handle is open. If a handle already exists
    /// it is kept and no second connection is made.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the database cannot be opened,
    /// unless `suppress` is set, in which case the failure is logged and
    /// `Ok(false)` is returned. Either way no handle is left behind.
    pub fn establish_connection(&mut self, suppress: bool) -> Result<bool> {
        if self.conn.is_some() {
            debug!("connection already established, reusing it");
            return Ok(true);
        }

        match self.open() {
            Ok(conn) => {
                info!(database = %self.connection_description(), "established connection with database");
                self.conn = Some(conn);
                Ok(true)
            }
            Err(e) if suppress => {
                warn!(error = %e, "failed to establish database connection");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns `true` if a connection handle is held.
    ///
    /// Does not check whether the backend is still responsive.
    pub fn check_connection(&self) -> bool {
        self.conn.is_some()
    }

    /// Closes and discards the connection. Does nothing if none is open.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if SQLite reports a failure while
    /// closing. The handle is discarded regardless.
    pub fn close_connection(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| DbError::Database(e))?;
        info!(database = %self.connection_description(), "closed database connection");
        Ok(())
    }

    /// Runs `f` inside a scoped transaction.
    ///
    /// Establishes a connection first if none is open. The transaction is
    /// committed when `f` returns `Ok` and rolled back when it returns `Err`
    /// or panics. The connection itself stays open afterwards.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use bbconf_sqlite::Database;
    /// let mut db = Database::in_memory();
    /// let version: String = db
    ///     .db_cursor(|tx| Ok(tx.query_row("SELECT sqlite_version()", [], |r| r.get(0))?))
    ///     .unwrap();
    /// println!("SQLite {version}");
    /// ```
    pub fn db_cursor<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        if self.conn.is_none() {
            self.establish_connection(false)?;
        }
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DbError::Connection("no open connection".to_string()))?;

        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    fn open(&self) -> Result<Connection> {
        let target = self.target()?;
        let conn = match &target {
            ConnectionTarget::Memory => Connection::open_in_memory(),
            ConnectionTarget::File(path) => Connection::open(path),
        }
        .map_err(|e| DbError::Connection(format!("{target}: {e}")))?;

        // Opening is lazy; touch the catalog so a bad file fails here.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|()| conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |r| r.get::<_, i64>(0)))
            .map_err(|e| DbError::Connection(format!("{target}: {e}")))?;

        Ok(conn)
    }
}

fn is_local_host(host: &str) -> bool {
    matches!(host.trim(), "" | "localhost" | "127.0.0.1" | "::1")
}
