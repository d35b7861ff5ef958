//! SQL identifier validation.
//!
//! Table and column names are interpolated into statements, so they are
//! checked against a conservative pattern before use. Values are always
//! parameter-bound and never pass through here.

use crate::error::{ConfigError, Result};

/// Returns `true` if `name` is a plain SQL identifier.
///
/// Accepts names that start with an ASCII letter or underscore, followed by
/// ASCII alphanumerics or underscores.
///
/// # Examples
///
/// ```
/// use bbconf_core::is_identifier;
///
/// assert!(is_identifier("bedfiles"));
/// assert!(is_identifier("_tmp_2"));
/// assert!(!is_identifier("2fast"));
/// assert!(!is_identifier("bedfiles; DROP TABLE bedsets"));
/// ```
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates that `name` is a plain SQL identifier.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidIdentifier`] if the name is empty or
/// contains anything other than ASCII alphanumerics and underscores.
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}
