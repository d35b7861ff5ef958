//! The [`BedBaseConf`] handle.

use std::path::{Path, PathBuf};

use bbconf_core::columns::{
    RECORD_KEY_COLUMN, bed_columns, bedset_columns, relationship_columns,
};
use bbconf_core::{BedBaseSettings, ConfigMap, select_config_path};
use bbconf_sqlite::{ColumnDefs, Condition, Database, Row};
use serde_yaml::Mapping;
use tracing::{debug, info};

use crate::error::Result;

/// Configuration and database access for one BEDbase deployment.
///
/// Created from a YAML config file. Holds the raw config tree, the validated
/// settings and a lazily connected [`Database`] for the bedfiles, bedsets and
/// bedset/bedfile relationship tables named in the config.
///
/// # Examples
///
/// ```no_run
/// use bbconf::{BedBaseConf, Condition};
///
/// let mut bbc = BedBaseConf::new(None).unwrap();
/// bbc.create_bedfiles_table(None).unwrap();
///
/// println!("{} bedfiles", bbc.count_bedfiles().unwrap());
/// let rows = bbc
///     .select_bedfiles(Some(&["name", "md5sum"]), Some(&Condition::new("regions_no > 1000")))
///     .unwrap();
/// for row in rows {
///     println!("{} {}", row["name"], row["md5sum"]);
/// }
/// ```
#[derive(Debug)]
pub struct BedBaseConf {
    config: ConfigMap,
    settings: BedBaseSettings,
    db: Database,
}

impl BedBaseConf {
    /// Loads the config file at `path`, or the one named by `$BEDBASE`.
    ///
    /// No database connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns a config error if no path can be determined, the file cannot
    /// be read, or required keys are missing.
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = select_config_path(path)?;
        let config = ConfigMap::load(&path)?;
        Self::from_config(config)
    }

    /// Like [`new`](Self::new), with `overrides` taking precedence over the
    /// file's values.
    pub fn with_overrides(path: Option<&Path>, overrides: &Mapping) -> Result<Self> {
        let path = select_config_path(path)?;
        let config = ConfigMap::load_with_overrides(&path, overrides)?;
        Self::from_config(config)
    }

    /// Builds the handle from an already loaded config tree.
    ///
    /// A relative database name is resolved against the directory of the
    /// config's source file, or the working directory if it has none.
    pub fn from_config(config: ConfigMap) -> Result<Self> {
        let settings = BedBaseSettings::from_config(&config)?;
        let base_dir = config
            .file_path()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        let db = Database::new(&settings.database, base_dir.as_deref());
        debug!(database = %db.connection_description(), "configured database");
        Ok(Self {
            config,
            settings,
            db,
        })
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }

    pub fn settings(&self) -> &BedBaseSettings {
        &self.settings
    }

    /// Path of the loaded config file, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.config.file_path()
    }

    /// Write mode of the config: `None` until fixed.
    pub fn writable(&self) -> Option<bool> {
        self.config.writable()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Writes the config tree back to its source file.
    pub fn write_config(&mut self) -> Result<PathBuf> {
        let path = self.config.write()?;
        info!(path = %path.display(), "wrote BEDbase config");
        Ok(path)
    }

    /// Local or remote bedstat output location.
    pub fn bedstat_output_path(&self, remote: bool) -> Result<PathBuf> {
        Ok(self.settings.path.bedstat_output_path(remote)?)
    }

    /// Local or remote bedbuncher output location.
    pub fn bedbuncher_output_path(&self, remote: bool) -> Result<PathBuf> {
        Ok(self.settings.path.bedbuncher_output_path(remote)?)
    }

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    pub fn establish_connection(&mut self, suppress: bool) -> Result<bool> {
        Ok(self.db.establish_connection(suppress)?)
    }

    pub fn check_connection(&self) -> bool {
        self.db.check_connection()
    }

    pub fn close_connection(&mut self) -> Result<()> {
        Ok(self.db.close_connection()?)
    }

    // ------------------------------------------------------------------
    // bedfiles
    // ------------------------------------------------------------------

    /// Creates the bedfiles table, with the default bedstat columns when
    /// `columns` is `None`.
    pub fn create_bedfiles_table(&mut self, columns: Option<ColumnDefs>) -> Result<()> {
        let columns = columns.unwrap_or_else(|| bed_columns().into());
        Ok(self.db.create_table(&self.settings.database.bed_table, columns)?)
    }

    pub fn drop_bedfiles_table(&mut self) -> Result<()> {
        Ok(self.db.drop_table(&self.settings.database.bed_table)?)
    }

    pub fn bedfiles_table_exists(&mut self) -> Result<bool> {
        Ok(self.db.table_exists(&self.settings.database.bed_table)?)
    }

    pub fn count_bedfiles(&mut self) -> Result<u64> {
        Ok(self.db.count_rows(&self.settings.database.bed_table)?)
    }

    pub fn bedfiles_column_types(&mut self) -> Result<Vec<(String, String)>> {
        Ok(self.db.table_column_types(&self.settings.database.bed_table)?)
    }

    pub fn select_bedfiles(
        &mut self,
        columns: Option<&[&str]>,
        condition: Option<&Condition>,
    ) -> Result<Vec<Row>> {
        Ok(self.db.select(&self.settings.database.bed_table, columns, condition)?)
    }

    /// Inserts one bedfile record and returns its id. A record whose
    /// `md5sum` is already stored fails with an insert error.
    pub fn insert_bedfile_data(&mut self, values: &Row) -> Result<i64> {
        Ok(self.db.insert_row(&self.settings.database.bed_table, values)?)
    }

    /// Inserts one bedfile record, or overwrites the columns given in
    /// `values` on the record with the same `md5sum`. Returns its id.
    pub fn insert_or_update_bedfile_data(&mut self, values: &Row) -> Result<i64> {
        Ok(self.db.insert_or_update_row(
            &self.settings.database.bed_table,
            values,
            RECORD_KEY_COLUMN,
        )?)
    }

    // ------------------------------------------------------------------
    // bedsets
    // ------------------------------------------------------------------

    /// Creates the bedsets table, with the default bedbuncher columns when
    /// `columns` is `None`.
    pub fn create_bedsets_table(&mut self, columns: Option<ColumnDefs>) -> Result<()> {
        let columns = columns.unwrap_or_else(|| bedset_columns().into());
        Ok(self.db.create_table(&self.settings.database.bedset_table, columns)?)
    }

    pub fn drop_bedsets_table(&mut self) -> Result<()> {
        Ok(self.db.drop_table(&self.settings.database.bedset_table)?)
    }

    pub fn bedsets_table_exists(&mut self) -> Result<bool> {
        Ok(self.db.table_exists(&self.settings.database.bedset_table)?)
    }

    pub fn count_bedsets(&mut self) -> Result<u64> {
        Ok(self.db.count_rows(&self.settings.database.bedset_table)?)
    }

    pub fn bedsets_column_types(&mut self) -> Result<Vec<(String, String)>> {
        Ok(self.db.table_column_types(&self.settings.database.bedset_table)?)
    }

    pub fn select_bedsets(
        &mut self,
        columns: Option<&[&str]>,
        condition: Option<&Condition>,
    ) -> Result<Vec<Row>> {
        Ok(self.db.select(&self.settings.database.bedset_table, columns, condition)?)
    }

    /// Inserts one bedset record and returns its id.
    pub fn insert_bedset_data(&mut self, values: &Row) -> Result<i64> {
        Ok(self.db.insert_row(&self.settings.database.bedset_table, values)?)
    }

    /// Inserts one bedset record, or updates the one with the same `md5sum`.
    pub fn insert_or_update_bedset_data(&mut self, values: &Row) -> Result<i64> {
        Ok(self.db.insert_or_update_row(
            &self.settings.database.bedset_table,
            values,
            RECORD_KEY_COLUMN,
        )?)
    }

    // ------------------------------------------------------------------
    // bedset_bedfiles
    // ------------------------------------------------------------------

    /// Creates the relationship table. The default columns reference the
    /// configured bedfiles and bedsets tables, which must already exist.
    pub fn create_bedset_bedfiles_table(&mut self, columns: Option<ColumnDefs>) -> Result<()> {
        let names = &self.settings.database;
        let columns = columns
            .unwrap_or_else(|| relationship_columns(&names.bed_table, &names.bedset_table).into());
        Ok(self.db.create_table(&names.relationship_table, columns)?)
    }

    pub fn drop_bedset_bedfiles_table(&mut self) -> Result<()> {
        Ok(self.db.drop_table(&self.settings.database.relationship_table)?)
    }

    /// Links a bedfile to a bedset.
    pub fn insert_bedset_bedfiles_data(&mut self, values: &Row) -> Result<()> {
        Ok(self.db.insert_link_row(values)?)
    }

    /// Selects the bedfiles belonging to any bedset matching `condition`.
    ///
    /// `condition` is evaluated against the bedsets table.
    pub fn select_bedfiles_for_bedset(
        &mut self,
        condition: &Condition,
        bedfile_columns: Option<&[&str]>,
    ) -> Result<Vec<Row>> {
        Ok(self.db.select_related(condition, bedfile_columns)?)
    }
}
