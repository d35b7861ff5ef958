//! Configuration primitives for BEDbase.
//!
//! This crate covers everything that happens before a database connection
//! exists:
//!
//! - [`select_config_path`]: picks the config file from an explicit path or
//!   the `$BEDBASE` environment variable.
//! - [`ConfigMap`]: the raw YAML tree with dotted-path access, overrides,
//!   and write-back to its source file.
//! - [`BedBaseSettings`]: the tree validated into typed `path`, `database`
//!   and `server` sections, with defaults filled in.
//! - [`columns`]: default column definitions for the bedfiles, bedsets and
//!   join tables.
//!
//! # Example
//!
//! ```no_run
//! use bbconf_core::{BedBaseSettings, ConfigMap, select_config_path};
//!
//! let path = select_config_path(None).unwrap();
//! let config = ConfigMap::load(&path).unwrap();
//! let settings = BedBaseSettings::from_config(&config).unwrap();
//!
//! println!("bedstat outputs: {}", settings.path.bedstat_output_path(false).unwrap().display());
//! println!("database: {}@{}:{}", settings.database.user, settings.database.host, settings.database.port);
//! ```

pub mod columns;
mod config_map;
mod error;
mod ident;
mod locate;
mod merge;
mod settings;

pub use config_map::ConfigMap;
pub use error::{ConfigError, Result};
pub use ident::{is_identifier, validate_identifier};
pub use locate::{CONFIG_ENV_VAR, select_config_path, select_config_path_from};
pub use merge::{MergeStrategy, merge_mappings};
pub use settings::{
    BedBaseSettings, DATABASE_SECTION, DatabaseSettings, PATH_SECTION, PathSettings,
    SERVER_SECTION, ServerSettings, expand_env_with,
};
