//! Config file selection.
//!
//! The config path is taken from an explicit argument first and from the
//! `$BEDBASE` environment variable second. There is no further fallback.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};

/// Environment variable consulted when no explicit config path is given.
pub const CONFIG_ENV_VAR: &str = "BEDBASE";

/// Determines the path of the BEDbase configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if no path is given and `$BEDBASE` is
/// unset or empty.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use bbconf_core::select_config_path;
///
/// let path = select_config_path(Some(Path::new("bedbase.yaml"))).unwrap();
/// assert_eq!(path, Path::new("bedbase.yaml"));
/// ```
pub fn select_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    select_config_path_from(explicit, std::env::var_os(CONFIG_ENV_VAR))
}

/// Same as [`select_config_path`], with the environment value supplied by
/// the caller.
pub fn select_config_path_from(explicit: Option<&Path>, env_value: Option<OsString>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "using explicit config path");
        return Ok(path.to_path_buf());
    }
    match env_value {
        Some(value) if !value.is_empty() => {
            let path = PathBuf::from(value);
            debug!(path = %path.display(), var = CONFIG_ENV_VAR, "using config path from environment");
            Ok(path)
        }
        _ => Err(ConfigError::NotFound(format!(
            "you must provide a config file or set the {CONFIG_ENV_VAR} environment variable"
        ))),
    }
}
