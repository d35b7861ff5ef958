//! Typed BEDbase settings derived from a [`ConfigMap`].
//!
//! The raw tree is validated into three sections at load time:
//!
//! - `path`: pipeline output locations (required)
//! - `database`: relational backend connection fields and table names
//! - `server`: host and port of the companion API server
//!
//! Missing `database` and `server` keys fall back to defaults; missing
//! required `path` keys are reported as [`ConfigError::MissingConfigData`].
//! String values are environment-expanded before typing, so
//! `pipeline_output_path: $BEDBASE_DATA/outputs` works as expected.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::config_map::ConfigMap;
use crate::error::{ConfigError, Result};
use crate::ident::validate_identifier;
use crate::merge::{MergeStrategy, merge_mappings};

pub const PATH_SECTION: &str = "path";
pub const DATABASE_SECTION: &str = "database";
pub const SERVER_SECTION: &str = "server";

const REQUIRED_PATH_KEYS: [&str; 3] = ["pipeline_output_path", "bedstat_dir", "bedbuncher_dir"];

/// Output locations shared with the bedstat and bedbuncher pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root directory the pipelines write into.
    pub pipeline_output_path: PathBuf,
    /// bedstat output directory, relative to the root.
    pub bedstat_dir: String,
    /// bedbuncher output directory, relative to the root.
    pub bedbuncher_dir: String,
    /// Base URL the outputs are served from, if they are hosted remotely.
    #[serde(default)]
    pub remote_url_base: Option<String>,
}

impl PathSettings {
    /// Returns the bedstat output location, local or remote.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingConfigData`] if `remote` is requested
    /// and no `remote_url_base` is configured.
    pub fn bedstat_output_path(&self, remote: bool) -> Result<PathBuf> {
        self.output_path(&self.bedstat_dir, remote)
    }

    /// Returns the bedbuncher output location, local or remote.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingConfigData`] if `remote` is requested
    /// and no `remote_url_base` is configured.
    pub fn bedbuncher_output_path(&self, remote: bool) -> Result<PathBuf> {
        self.output_path(&self.bedbuncher_dir, remote)
    }

    fn output_path(&self, dir: &str, remote: bool) -> Result<PathBuf> {
        if remote {
            let base = self.remote_url_base.as_deref().ok_or_else(|| {
                ConfigError::MissingConfigData(format!("{PATH_SECTION}.remote_url_base"))
            })?;
            Ok(PathBuf::from(format!("{}/{dir}", base.trim_end_matches('/'))))
        } else {
            Ok(self.pipeline_output_path.join(dir))
        }
    }
}

/// Relational backend connection fields and table names.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database name. For the SQLite backend this is the database file.
    pub name: String,
    pub bed_table: String,
    pub bedset_table: String,
    pub relationship_table: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "bedbasepassword".to_string(),
            name: "postgres".to_string(),
            bed_table: "bedfiles".to_string(),
            bedset_table: "bedsets".to_string(),
            relationship_table: "bedset_bedfiles".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .field("bed_table", &self.bed_table)
            .field("bedset_table", &self.bedset_table)
            .field("relationship_table", &self.relationship_table)
            .finish()
    }
}

/// Host and port of the companion API server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

/// Validated settings for one BEDbase deployment.
///
/// # Examples
///
/// ```
/// use bbconf_core::{BedBaseSettings, ConfigMap};
///
/// let tree = serde_yaml::from_str(r#"
/// path:
///   pipeline_output_path: /data
///   bedstat_dir: bedstat
///   bedbuncher_dir: bedbuncher
/// database:
///   name: bedbase
/// "#).unwrap();
/// let settings = BedBaseSettings::from_config(&ConfigMap::from_mapping(tree)).unwrap();
///
/// assert_eq!(settings.database.name, "bedbase");
/// assert_eq!(settings.database.host, "localhost");
/// assert_eq!(settings.server.port, 80);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedBaseSettings {
    pub path: PathSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl BedBaseSettings {
    /// Validates a config tree into typed settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingConfigData`] if a required key is
    /// absent, [`ConfigError::InvalidIdentifier`] if a configured table name
    /// is not a plain identifier, or [`ConfigError::YamlError`] if a value
    /// has the wrong type.
    pub fn from_config(config: &ConfigMap) -> Result<Self> {
        let data = config.data();
        check_required(data)?;

        let filled = merge_mappings(data, &default_sections()?, MergeStrategy::PreferBase);
        log_filled_defaults(data, &filled);

        let expanded = expand_env_in_value(&Value::Mapping(filled), &|var| std::env::var(var).ok());
        let settings: BedBaseSettings = serde_yaml::from_value(expanded)?;

        validate_identifier(&settings.database.bed_table)?;
        validate_identifier(&settings.database.bedset_table)?;
        validate_identifier(&settings.database.relationship_table)?;

        Ok(settings)
    }
}

fn check_required(data: &Mapping) -> Result<()> {
    let path = match data.get(PATH_SECTION) {
        Some(Value::Mapping(section)) => section.clone(),
        Some(Value::Null) => Mapping::new(),
        Some(_) => {
            return Err(ConfigError::MissingConfigData(format!(
                "{PATH_SECTION} (must be a mapping)"
            )));
        }
        None => return Err(ConfigError::MissingConfigData(PATH_SECTION.to_string())),
    };

    for key in REQUIRED_PATH_KEYS {
        match path.get(key) {
            Some(Value::Null) | None => {
                return Err(ConfigError::MissingConfigData(format!("{PATH_SECTION}.{key}")));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Default values for every defaulted key, keyed by section.
fn default_sections() -> Result<Mapping> {
    let mut path = Mapping::new();
    path.insert(Value::from("remote_url_base"), Value::Null);

    let mut sections = Mapping::new();
    sections.insert(Value::from(PATH_SECTION), Value::Mapping(path));
    sections.insert(
        Value::from(DATABASE_SECTION),
        serde_yaml::to_value(DatabaseSettings::default())?,
    );
    sections.insert(
        Value::from(SERVER_SECTION),
        serde_yaml::to_value(ServerSettings::default())?,
    );
    Ok(sections)
}

fn log_filled_defaults(original: &Mapping, filled: &Mapping) {
    for (section, values) in filled {
        let (Some(section), Some(values)) = (section.as_str(), values.as_mapping()) else {
            continue;
        };
        let present = original.get(section).and_then(Value::as_mapping);
        for (key, value) in values {
            let Some(key) = key.as_str() else { continue };
            if present.is_none_or(|m| !m.contains_key(key)) {
                debug!("config lacks '{section}.{key}' key, setting to: {value:?}");
            }
        }
    }
}

/// Expands `$VAR` and `${VAR}` references in a string.
///
/// Unknown variables are left untouched, as is a `$` not followed by a
/// variable name.
///
/// # Examples
///
/// ```
/// use bbconf_core::expand_env_with;
///
/// let lookup = |var: &str| (var == "HOME").then(|| "/home/me".to_string());
/// assert_eq!(expand_env_with("$HOME/data", &lookup), "/home/me/data");
/// assert_eq!(expand_env_with("${HOME}x", &lookup), "/home/mex");
/// assert_eq!(expand_env_with("$NOPE/data", &lookup), "$NOPE/data");
/// ```
pub fn expand_env_with(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), lookup(name)) {
            (false, Some(value)) => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}

fn expand_env_in_value(value: &Value, lookup: &dyn Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::String(s) if s.contains('$') => Value::String(expand_env_with(s, lookup)),
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .map(|(k, v)| (k.clone(), expand_env_in_value(v, lookup)))
                .collect(),
        ),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|v| expand_env_in_value(v, lookup)).collect())
        }
        other => other.clone(),
    }
}
