//! Typed error types for the db crate.

use thiserror::Error;

/// Errors surfaced by repositories and the connection factory.
///
/// Every failure is returned to the immediate caller unchanged. Nothing in
/// this crate retries.
#[derive(Debug, Error)]
pub enum DbError {
    /// The caller passed a malformed entity, id, update set or database name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any failure while talking to the database server.
    #[error("storage access error: {0}")]
    StorageAccess(#[from] sqlx::Error),

    /// The configured driver is unknown or could not be initialised.
    #[error("database driver unavailable: {0}")]
    DriverUnavailable(String),
}

impl DbError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// `true` for caller errors (`InvalidArgument`).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Errors produced while loading [`crate::DbConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}
