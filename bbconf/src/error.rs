//! Error type for the combined config and database handle.

use bbconf_core::ConfigError;
use bbconf_sqlite::DbError;
use thiserror::Error;

/// Errors raised by [`BedBaseConf`](crate::BedBaseConf).
#[derive(Debug, Error)]
pub enum BedBaseConfError {
    /// Loading, validating or writing the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A database operation failed.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Convenience alias for results with [`BedBaseConfError`].
pub type Result<T> = std::result::Result<T, BedBaseConfError>;
