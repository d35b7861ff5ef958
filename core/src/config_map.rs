//! YAML-backed configuration tree with dotted-path access and write-back.
//!
//! A [`ConfigMap`] holds the raw key/value tree of one YAML document,
//! remembers where it came from, and can persist itself back to that file.
//! Typed access goes through [`BedBaseSettings`](crate::BedBaseSettings),
//! which is derived from the tree.
//!
//! # Example YAML
//!
//! ```yaml
//! path:
//!   pipeline_output_path: /data/outputs
//!   bedstat_dir: bedstat_output
//!   bedbuncher_dir: bedbuncher_output
//! database:
//!   host: localhost
//!   name: bedbase.sqlite
//! server:
//!   port: 8000
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::merge::{MergeStrategy, merge_mappings};

/// In-memory tree of one YAML configuration document.
///
/// The tree is never mutated in place after construction; the only way to
/// change what is on disk is [`write`](Self::write), which re-serializes the
/// whole tree to its source path.
///
/// # Examples
///
/// ```no_run
/// use bbconf_core::ConfigMap;
///
/// let cfg = ConfigMap::load("bedbase.yaml").unwrap();
/// assert_eq!(cfg.file_path().unwrap().to_str(), Some("bedbase.yaml"));
/// if let Some(host) = cfg.get("database.host").and_then(|v| v.as_str()) {
///     println!("database host: {host}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigMap {
    data: Mapping,
    file_path: Option<PathBuf>,
    writable: Option<bool>,
}

impl ConfigMap {
    /// Loads a configuration tree from a YAML file.
    ///
    /// An empty document yields an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is not a readable file,
    /// [`ConfigError::YamlError`] if it is not valid YAML, or
    /// [`ConfigError::InvalidStructure`] if the top level is not a mapping.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let file = File::open(path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {e}", path.display())))?;
        let value: Value = serde_yaml::from_reader(BufReader::new(file))?;

        let data = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(ConfigError::InvalidStructure {
                    path: path.to_path_buf(),
                    reason: format!("top level must be a mapping, found {}", kind(&other)),
                });
            }
        };

        debug!(path = %path.display(), keys = data.len(), "loaded config file");
        Ok(Self {
            data,
            file_path: Some(path.to_path_buf()),
            writable: None,
        })
    }

    /// Loads a configuration tree and lays `overrides` on top of it.
    ///
    /// Override values replace matching keys; nested mappings merge
    /// recursively, so keys only present in the file are preserved.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_overrides(path: impl AsRef<Path>, overrides: &Mapping) -> Result<Self> {
        let mut cfg = Self::load(path)?;
        if !overrides.is_empty() {
            cfg.data = merge_mappings(&cfg.data, overrides, MergeStrategy::PreferOverlay);
            debug!(keys = overrides.len(), "applied config overrides");
        }
        Ok(cfg)
    }

    /// Creates a tree with no backing file.
    pub fn from_mapping(data: Mapping) -> Self {
        Self {
            data,
            file_path: None,
            writable: None,
        }
    }

    /// Returns the path this tree was loaded from, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Returns the write mode: `None` until a mode is fixed by
    /// [`make_writable`](Self::make_writable), [`make_readonly`](Self::make_readonly)
    /// or a [`write`](Self::write) attempt.
    pub fn writable(&self) -> Option<bool> {
        self.writable
    }

    /// Returns the underlying tree.
    pub fn data(&self) -> &Mapping {
        &self.data
    }

    /// Consumes the map and returns the underlying tree.
    pub fn into_data(self) -> Mapping {
        self.data
    }

    /// Looks up a value by dotted path, e.g. `database.host`.
    ///
    /// Returns `None` if any segment is missing or an intermediate value is
    /// not a mapping.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.');
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns `true` if a value exists at the dotted path.
    pub fn contains(&self, dotted: &str) -> bool {
        self.get(dotted).is_some()
    }

    /// Fixes the write mode to writable after checking the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotWritable`] if there is no backing file or it
    /// cannot be opened for writing; the mode is then fixed to read-only.
    pub fn make_writable(&mut self) -> Result<()> {
        let path = self.backing_path()?;
        match OpenOptions::new().append(true).open(&path) {
            Ok(_) => {
                self.writable = Some(true);
                Ok(())
            }
            Err(e) => {
                self.writable = Some(false);
                Err(ConfigError::NotWritable(format!("{}: {e}", path.display())))
            }
        }
    }

    /// Fixes the write mode to read-only. Subsequent writes fail.
    pub fn make_readonly(&mut self) {
        self.writable = Some(false);
    }

    /// Re-serializes the full tree to its source path.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it, so a failed write leaves the previous file intact.
    /// The first attempt fixes the write mode if none was set. Returns the
    /// path written to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotWritable`] if the map is read-only, has no
    /// backing file, or the file cannot be replaced, and
    /// [`ConfigError::YamlError`] if serialization fails.
    pub fn write(&mut self) -> Result<PathBuf> {
        if self.writable == Some(false) {
            return Err(ConfigError::NotWritable(format!(
                "{} is read-only",
                self.describe_source()
            )));
        }
        let path = self.backing_path()?;
        if path.exists() {
            if let Err(e) = OpenOptions::new().append(true).open(&path) {
                self.writable = Some(false);
                return Err(ConfigError::NotWritable(format!("{}: {e}", path.display())));
            }
        }
        if let Err(e) = replace_file(&path, &self.data) {
            if matches!(e, ConfigError::NotWritable(_)) {
                self.writable = Some(false);
            }
            return Err(e);
        }
        self.writable = Some(true);
        debug!(path = %path.display(), "wrote config file");
        Ok(path)
    }

    /// Writes a copy of the tree to another path.
    ///
    /// Does not change this map's source path or write mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotWritable`] if `path` cannot be created.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        replace_file(path.as_ref(), &self.data)
    }

    /// Serializes the tree to a YAML string.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.data)?)
    }

    fn backing_path(&self) -> Result<PathBuf> {
        self.file_path
            .clone()
            .ok_or_else(|| ConfigError::NotWritable("config has no backing file".to_string()))
    }

    fn describe_source(&self) -> String {
        match &self.file_path {
            Some(path) => path.display().to_string(),
            None => "in-memory config".to_string(),
        }
    }
}

/// Serializes `data` into a temporary sibling of `path`, then renames it
/// into place. An existing file keeps its permissions.
fn replace_file(path: &Path, data: &Mapping) -> Result<()> {
    let not_writable = |e: std::io::Error| ConfigError::NotWritable(format!("{}: {e}", path.display()));
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir).map_err(not_writable)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_yaml::to_writer(&mut writer, data)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| not_writable(e.error))?;
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
