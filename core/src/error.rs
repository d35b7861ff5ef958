//! Error types for configuration loading and validation.
//!
//! Provides a unified error type covering config file selection, YAML
//! parsing, settings validation, and write-back failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, validating, or persisting a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No readable config file could be found.
    #[error("config file not found: {0}")]
    NotFound(String),

    /// A required section or key is absent from the config.
    #[error("config lacks '{0}' key")]
    MissingConfigData(String),

    /// The config cannot be written back to disk.
    #[error("config is not writable: {0}")]
    NotWritable(String),

    /// The YAML document does not have the expected shape.
    #[error("invalid config structure in {path}: {reason}")]
    InvalidStructure { path: PathBuf, reason: String },

    /// A table or column name contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid identifier '{0}': must start with a letter or underscore and contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
